pub mod config;
pub mod errors;
pub mod file_service;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod preprocess;
pub mod routes;
pub mod swagger;

use axum::{extract::DefaultBodyLimit, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Config;
use file_service::FileService;
use ocr::OcrService;
use pdf::PdfRenderer;
use pipeline::DocumentProcessor;

/// Room for multipart boundaries and the small text fields around the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub processor: DocumentProcessor,
}

impl AppState {
    pub fn new(config: Config, ocr: Arc<OcrService>) -> Self {
        let files = FileService::new(
            config.upload_path.clone(),
            config.allowed_file_types.clone(),
            config.max_upload_bytes,
        );
        let pdf = PdfRenderer::new(config.pdf_font_path.clone());
        let processor = DocumentProcessor::new(files, ocr, pdf, config.ocr_language.clone());
        Self { config, processor }
    }
}

/// Health check endpoint for monitoring
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(serde_json::json!({"status": "ok"})))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .processor
        .files()
        .max_file_size()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/api/health", get(health_check))
        .merge(routes::pages::router())
        .merge(routes::process::router())
        .merge(routes::download::router())
        .nest("/api/ocr", routes::ocr::router())
        .merge(swagger::create_swagger_router())
        .fallback(errors::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

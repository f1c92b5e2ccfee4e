use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use std::sync::Arc;

use crate::{
    models::OcrHealthResponse,
    ocr::{error::OcrError, health::OcrHealthChecker},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(ocr_health))
}

#[utoipa::path(
    get,
    path = "/api/ocr/health",
    tag = "ocr",
    responses(
        (status = 200, description = "OCR engine status", body = OcrHealthResponse),
        (status = 500, description = "Health check could not run")
    )
)]
pub async fn ocr_health(State(state): State<Arc<AppState>>) -> Result<Json<OcrHealthResponse>, StatusCode> {
    let engine = state.processor.ocr().engine_name();
    let default_language = state.processor.default_language().to_string();
    let tesseract_cmd = state.config.tesseract_cmd.clone();
    let check_tesseract = engine == "tesseract";

    // The checks shell out synchronously.
    let response = tokio::task::spawn_blocking(move || {
        let checker = OcrHealthChecker::new(tesseract_cmd);
        let mut errors: Vec<String> = Vec::new();
        let mut tesseract_version = None;
        let mut available_languages = Vec::new();

        if check_tesseract {
            match checker.check_tesseract_installation() {
                Ok(version) => tesseract_version = Some(version),
                Err(e) => errors.push(e.to_string()),
            }
            match checker.get_available_languages() {
                Ok(langs) => available_languages = langs,
                Err(OcrError::TesseractNotInstalled) => {}
                Err(e) => errors.push(e.to_string()),
            }
            if tesseract_version.is_some() {
                if let Err(e) = checker.check_language_data(&default_language) {
                    errors.push(e.to_string());
                }
            }
        }

        OcrHealthResponse {
            status: if errors.is_empty() { "healthy" } else { "degraded" }.to_string(),
            engine: engine.to_string(),
            default_language,
            tesseract_version,
            available_languages,
            memory_available_mb: checker.check_memory_available(),
            errors,
        }
    })
    .await
    .map_err(|e| {
        tracing::error!("OCR health check task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(response))
}

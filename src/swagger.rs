use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use axum::Router;
use std::sync::Arc;

use crate::{
    models::{
        BoundingBox, ErrorResponse, OcrHealthResponse, ProcessResponse, Table, TextBlock,
    },
    AppState,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::health_check,
        // OCR endpoints
        crate::routes::process::process_image,
        crate::routes::process::upload_form,
        crate::routes::ocr::ocr_health,
        // File endpoints
        crate::routes::download::download_file,
    ),
    components(
        schemas(
            BoundingBox, TextBlock, Table, ProcessResponse, ErrorResponse, OcrHealthResponse
        )
    ),
    tags(
        (name = "health", description = "Liveness endpoints"),
        (name = "ocr", description = "Image to text and PDF conversion"),
        (name = "files", description = "Stored uploads and generated PDFs"),
    ),
    info(
        title = "ocr2pdf API",
        version = "0.3.0",
        description = "Nepali OCR with searchable PDF output"
    )
)]
pub struct ApiDoc;

pub fn create_swagger_router() -> Router<Arc<AppState>> {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

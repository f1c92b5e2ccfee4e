use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, Json},
    routing::post,
    Router,
};
use std::sync::Arc;

use crate::{
    errors::ProcessingError,
    file_service::{UploadError, UploadedFile},
    models::ProcessResponse,
    pipeline::ProcessedDocument,
    routes::pages::render_result,
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_form))
        .route("/process", post(process_image))
}

/// Fields collected from an upload form.
struct UploadForm {
    file: Option<UploadedFile>,
    language: Option<String>,
}

fn multipart_error(err: MultipartError, max: usize) -> ProcessingError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::BodyTooLarge { max }.into()
    } else {
        UploadError::Malformed {
            message: err.body_text(),
        }
        .into()
    }
}

async fn read_upload_form(
    multipart: &mut Multipart,
    file_fields: &[&str],
    max: usize,
) -> Result<UploadForm, ProcessingError> {
    let mut form = UploadForm {
        file: None,
        language: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max))?
    {
        let name = field.name().unwrap_or("").to_string();

        if file_fields.contains(&name.as_str()) {
            let filename = field.file_name().unwrap_or("").to_string();
            let data = field.bytes().await.map_err(|e| multipart_error(e, max))?;
            tracing::info!("Received file: {}, size: {} bytes", filename, data.len());
            form.file = Some(UploadedFile { filename, data });
        } else if name == "language" {
            let language = field.text().await.map_err(|e| multipart_error(e, max))?;
            form.language = Some(language);
        } else {
            tracing::debug!("Ignoring multipart field: {}", name);
        }
    }

    Ok(form)
}

async fn run(
    state: &AppState,
    mut multipart: Multipart,
    file_fields: &[&str],
) -> Result<ProcessedDocument, ProcessingError> {
    let max = state.processor.files().max_file_size();
    let form = read_upload_form(&mut multipart, file_fields, max).await?;
    let file = form.file.ok_or(UploadError::MissingFile)?;
    if file.filename.is_empty() {
        return Err(UploadError::EmptyFilename.into());
    }

    state.processor.process(file, form.language.as_deref()).await
}

#[utoipa::path(
    post,
    path = "/process",
    tag = "ocr",
    description = "Multipart form with an `image` (or `file`) part and an optional `language` part",
    responses(
        (status = 200, description = "Recognized text and a link to the generated PDF", body = ProcessResponse),
        (status = 400, description = "Missing file, disallowed file type or invalid language", body = crate::models::ErrorResponse),
        (status = 413, description = "Upload exceeds the size limit", body = crate::models::ErrorResponse),
        (status = 500, description = "Processing failed", body = crate::models::ErrorResponse)
    )
)]
pub async fn process_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ProcessingError> {
    let document = run(&state, multipart, &["image", "file"]).await?;

    Ok(Json(ProcessResponse {
        success: true,
        text: document.ocr.text(),
        confidence: document.ocr.confidence,
        pdf_url: document.pdf_url(),
        blocks: document.ocr.blocks,
        tables: document.ocr.tables,
    }))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "ocr",
    description = "Form upload with a `file` part; answers with an HTML result page",
    responses(
        (status = 200, description = "HTML page with the recognized text and a PDF link", body = String, content_type = "text/html"),
        (status = 400, description = "Missing file or disallowed file type", body = crate::models::ErrorResponse),
        (status = 413, description = "Upload exceeds the size limit", body = crate::models::ErrorResponse),
        (status = 500, description = "Processing failed", body = crate::models::ErrorResponse)
    )
)]
pub async fn upload_form(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Html<String>, ProcessingError> {
    let document = run(&state, multipart, &["file"]).await?;
    Ok(Html(render_result(&document)?))
}

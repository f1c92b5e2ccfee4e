use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::{errors::ProcessingError, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/download/{filename}", get(download_file))
}

#[utoipa::path(
    get,
    path = "/download/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Name of a stored upload or generated PDF")
    ),
    responses(
        (status = 200, description = "File contents as an attachment"),
        (status = 400, description = "Filename is not a plain stored name", body = crate::models::ErrorResponse),
        (status = 404, description = "No such file", body = crate::models::ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ProcessingError> {
    let files = state.processor.files();
    let path = files.resolve_download(&filename).await?;
    let data = files.read_file(&path).await?;

    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    Ok((
        [
            (CONTENT_TYPE, mime_type),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        data,
    )
        .into_response())
}

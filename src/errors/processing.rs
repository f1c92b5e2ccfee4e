use axum::http::StatusCode;
use thiserror::Error;

use super::{impl_into_response, AppError};
use crate::file_service::UploadError;
use crate::ocr::error::OcrError;
use crate::pdf::PdfError;
use crate::preprocess::PreprocessError;

/// Failure of any stage of the upload → OCR → PDF pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Failed to render page: {0}")]
    Page(#[from] askama::Error),
}

impl ProcessingError {
    pub fn is_input_error(&self) -> bool {
        match self {
            ProcessingError::Upload(e) => !matches!(e, UploadError::Io { .. }),
            ProcessingError::Ocr(e) => e.is_input_error(),
            _ => false,
        }
    }
}

impl AppError for ProcessingError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProcessingError::Upload(UploadError::TooLarge { .. } | UploadError::BodyTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ProcessingError::Upload(UploadError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ProcessingError::Ocr(OcrError::ServiceShutDown) => StatusCode::SERVICE_UNAVAILABLE,
            e if e.is_input_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            ProcessingError::Upload(UploadError::Io { .. }) => "Could not store the file".to_string(),
            ProcessingError::Upload(e) => e.to_string(),
            ProcessingError::Preprocess(_) => "The file could not be read as an image".to_string(),
            ProcessingError::Ocr(e) if e.is_input_error() => e.to_string(),
            ProcessingError::Ocr(OcrError::ServiceShutDown) => "Service is shutting down".to_string(),
            ProcessingError::Ocr(_) => "Text recognition failed".to_string(),
            ProcessingError::Pdf(_) => "PDF generation failed".to_string(),
            ProcessingError::Page(_) => "Could not render the page".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ProcessingError::Upload(UploadError::TooLarge { .. } | UploadError::BodyTooLarge { .. }) => {
                "PAYLOAD_TOO_LARGE"
            }
            ProcessingError::Upload(UploadError::NotFound { .. }) => "NOT_FOUND",
            ProcessingError::Upload(UploadError::Io { .. }) => "STORAGE_FAILED",
            ProcessingError::Upload(_) => "INVALID_INPUT",
            ProcessingError::Preprocess(_) => "IMAGE_LOAD_FAILED",
            ProcessingError::Ocr(e) if e.is_input_error() => "INVALID_INPUT",
            ProcessingError::Ocr(OcrError::ServiceShutDown) => "SERVICE_UNAVAILABLE",
            ProcessingError::Ocr(_) => "OCR_FAILED",
            ProcessingError::Pdf(_) => "PDF_RENDER_FAILED",
            ProcessingError::Page(_) => "PAGE_RENDER_FAILED",
        }
    }
}

impl_into_response!(ProcessingError);

use axum::http::StatusCode;
use thiserror::Error;

/// Common trait for all HTTP-facing error types
pub trait AppError: std::error::Error + Send + Sync + 'static {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get the error code for frontend handling
    fn error_code(&self) -> &'static str;
}

/// Macro to implement IntoResponse for all AppError types
/// This provides consistent HTTP response formatting
macro_rules! impl_into_response {
    ($error_type:ty) => {
        impl axum::response::IntoResponse for $error_type {
            fn into_response(self) -> axum::response::Response {
                use crate::errors::AppError;
                use axum::response::Json;

                let status = self.status_code();
                if status.is_server_error() {
                    tracing::error!(code = self.error_code(), "Request failed: {}", self);
                } else {
                    tracing::warn!(code = self.error_code(), "Request rejected: {}", self);
                }

                let body = Json(crate::models::ErrorResponse {
                    error: self.user_message(),
                    code: self.error_code().to_string(),
                    status: status.as_u16(),
                });

                (status, body).into_response()
            }
        }
    };
}

pub(crate) use impl_into_response;

/// Generic API error for cases where specific error types don't apply
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found")]
    NotFound,
}

impl AppError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn user_message(&self) -> String {
        match self {
            ApiError::NotFound => "Resource not found".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "NOT_FOUND",
        }
    }
}

impl_into_response!(ApiError);

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub mod processing;

pub use processing::ProcessingError;

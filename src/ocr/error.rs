use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Tesseract is not installed on the system")]
    TesseractNotInstalled,

    #[error("Tesseract language data not found for '{lang}'. Please install tesseract-ocr-{lang}")]
    LanguageDataNotFound { lang: String },

    #[error("Invalid OCR language '{lang}': {reason}")]
    InvalidLanguage { lang: String, reason: String },

    #[error("Insufficient memory for OCR operation. Required: {required}MB, Available: {available}MB")]
    InsufficientMemory { required: u64, available: u64 },

    #[error("Invalid image format or corrupted image: {details}")]
    InvalidImageFormat { details: String },

    #[error("OCR timeout after {seconds} seconds. Consider reducing image size or quality")]
    OcrTimeout { seconds: u64 },

    #[error("{engine} engine failed: {message}")]
    EngineFailed { engine: &'static str, message: String },

    #[error("Unexpected {engine} output: {details}")]
    MalformedOutput { engine: &'static str, details: String },

    #[error("OCR service has been shut down")]
    ServiceShutDown,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OcrError {
    pub fn engine_failed<S: Into<String>>(engine: &'static str, message: S) -> Self {
        Self::EngineFailed {
            engine,
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(engine: &'static str, details: S) -> Self {
        Self::MalformedOutput {
            engine,
            details: details.into(),
        }
    }

    /// Errors caused by what the caller sent rather than by the engine.
    pub fn is_input_error(&self) -> bool {
        matches!(self, OcrError::InvalidLanguage { .. })
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            OcrError::TesseractNotInstalled | OcrError::LanguageDataNotFound { .. }
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OcrError::TesseractNotInstalled => "OCR_NOT_INSTALLED",
            OcrError::LanguageDataNotFound { .. } => "OCR_LANG_MISSING",
            OcrError::InvalidLanguage { .. } => "OCR_INVALID_LANGUAGE",
            OcrError::InsufficientMemory { .. } => "OCR_OUT_OF_MEMORY",
            OcrError::InvalidImageFormat { .. } => "OCR_INVALID_FORMAT",
            OcrError::OcrTimeout { .. } => "OCR_TIMEOUT",
            OcrError::EngineFailed { .. } => "OCR_ENGINE_FAILED",
            OcrError::MalformedOutput { .. } => "OCR_MALFORMED_OUTPUT",
            OcrError::ServiceShutDown => "OCR_SHUT_DOWN",
            OcrError::Io(_) => "OCR_IO_ERROR",
        }
    }
}

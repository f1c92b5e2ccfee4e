use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::ProcessingError;
use crate::file_service::{FileService, StoredFile, UploadedFile};
use crate::models::OcrResult;
use crate::ocr::OcrService;
use crate::pdf::PdfRenderer;
use crate::preprocess::load_grayscale;

/// Outcome of one accepted upload.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub upload: StoredFile,
    pub language: String,
    pub ocr: OcrResult,
    pub pdf_filename: String,
    pub pdf_path: PathBuf,
}

impl ProcessedDocument {
    pub fn pdf_url(&self) -> String {
        format!("/download/{}", urlencoding::encode(&self.pdf_filename))
    }
}

/// Runs upload → grayscale → OCR → PDF for a single file.
///
/// Each stage fails the whole request; nothing is retried and no partial
/// result is returned.
#[derive(Clone)]
pub struct DocumentProcessor {
    files: FileService,
    ocr: Arc<OcrService>,
    pdf: PdfRenderer,
    default_language: String,
}

impl DocumentProcessor {
    pub fn new(files: FileService, ocr: Arc<OcrService>, pdf: PdfRenderer, default_language: String) -> Self {
        Self {
            files,
            ocr,
            pdf,
            default_language,
        }
    }

    pub fn files(&self) -> &FileService {
        &self.files
    }

    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    #[instrument(skip_all, fields(filename = %upload.filename, size = upload.data.len()))]
    pub async fn process(&self, upload: UploadedFile, language: Option<&str>) -> Result<ProcessedDocument, ProcessingError> {
        let language = match language.map(str::trim) {
            Some(lang) if !lang.is_empty() => lang.to_string(),
            _ => self.default_language.clone(),
        };

        let stored = self.files.save_upload(&upload).await?;
        let pdf_filename = self.files.pdf_filename_for(&stored.filename);
        let pdf_path = self.files.path_for(&pdf_filename);

        let ocr = self.process_image_file(&stored.path, &pdf_path, &language).await?;

        info!(
            "Processed '{}' -> '{}' ({} lines, {:.2} confidence)",
            stored.filename,
            pdf_filename,
            ocr.lines.len(),
            ocr.confidence
        );

        Ok(ProcessedDocument {
            upload: stored,
            language,
            ocr,
            pdf_filename,
            pdf_path,
        })
    }

    /// Recognize the image at `image_path` and write the text PDF to
    /// `pdf_path`.
    pub async fn process_image_file(
        &self,
        image_path: &Path,
        pdf_path: &Path,
        language: &str,
    ) -> Result<OcrResult, ProcessingError> {
        let image = load_grayscale(image_path).await?;
        let ocr = self.ocr.recognize(&image, language).await?;
        self.pdf.render_to_file(ocr.lines.clone(), pdf_path).await?;
        Ok(ocr)
    }
}

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::ocr::EngineKind;

/// Font shipped next to the upload form for Devanagari output.
pub const BUNDLED_FONT_PATH: &str = "static/fonts/NotoSansDevanagari-Regular.ttf";

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_address: String,
    pub upload_path: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_file_types: Vec<String>,
    pub ocr_engine: EngineKind,
    pub ocr_language: String,
    pub tesseract_cmd: String,
    pub paddle_ocr_url: String,
    pub ocr_max_concurrency: usize,
    pub ocr_timeout_seconds: Option<u64>,
    pub ocr_memory_check: bool,
    pub pdf_font_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "0.0.0.0:8000".to_string(),
            upload_path: PathBuf::from("./static/uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_file_types: parse_list("png,jpg,jpeg,tiff,pdf"),
            ocr_engine: EngineKind::Tesseract,
            ocr_language: "nep".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            paddle_ocr_url: "http://127.0.0.1:8866/predict/ocr_system".to_string(),
            ocr_max_concurrency: 2,
            ocr_timeout_seconds: None,
            ocr_memory_check: true,
            pdf_font_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let pdf_font_path = match env::var("PDF_FONT_PATH") {
            Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            _ => Some(PathBuf::from(BUNDLED_FONT_PATH)).filter(|p| p.exists()),
        };

        let ocr_engine = match env::var("OCR_ENGINE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.ocr_engine,
        };

        let config = Config {
            server_address: env::var("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            upload_path: env::var("UPLOAD_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_path),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes),
            allowed_file_types: env::var("ALLOWED_FILE_TYPES")
                .map(|s| parse_list(&s))
                .unwrap_or(defaults.allowed_file_types),
            ocr_engine,
            ocr_language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr_language),
            tesseract_cmd: env::var("TESSERACT_CMD").unwrap_or(defaults.tesseract_cmd),
            paddle_ocr_url: env::var("PADDLE_OCR_URL").unwrap_or(defaults.paddle_ocr_url),
            ocr_max_concurrency: parse_var("OCR_MAX_CONCURRENCY")?
                .unwrap_or(defaults.ocr_max_concurrency),
            ocr_timeout_seconds: parse_var("OCR_TIMEOUT_SECONDS")?,
            ocr_memory_check: parse_var("OCR_MEMORY_CHECK")?.unwrap_or(defaults.ocr_memory_check),
            pdf_font_path,
        };

        if config.ocr_max_concurrency == 0 {
            return Err(anyhow!("OCR_MAX_CONCURRENCY must be at least 1"));
        }
        if config.allowed_file_types.is_empty() {
            return Err(anyhow!("ALLOWED_FILE_TYPES must list at least one extension"));
        }

        Ok(config)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_path
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {}: {}", name, raw)),
        _ => Ok(None),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allow_list() {
        let config = Config::default();
        assert_eq!(config.allowed_file_types, vec!["png", "jpg", "jpeg", "tiff", "pdf"]);
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_parse_list_normalizes_entries() {
        assert_eq!(parse_list(" PNG, .jpg ,,tiff"), vec!["png", "jpg", "tiff"]);
    }
}

pub mod confidence;
pub mod error;
pub mod health;
pub mod layout;
pub mod paddle;
pub mod tesseract;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::GrayImage;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::models::OcrResult;
use crate::ocr::error::OcrError;
use crate::ocr::health::{validate_language_combination, OcrHealthChecker};
use crate::ocr::paddle::PaddleOcrEngine;
use crate::ocr::tesseract::TesseractEngine;

/// A text recognition backend.
///
/// Implementations must be usable from several requests at once; the
/// service in front of them bounds how many calls run concurrently.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recognize(&self, image: &GrayImage, language: &str) -> Result<OcrResult, OcrError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Tesseract,
    Paddle,
}

impl FromStr for EngineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Ok(EngineKind::Tesseract),
            "paddle" | "paddleocr" => Ok(EngineKind::Paddle),
            other => Err(anyhow!("unknown OCR engine '{}', expected 'tesseract' or 'paddle'", other)),
        }
    }
}

/// The process-wide OCR entry point, built once at start-up and shared by
/// every request.
pub struct OcrService {
    engine: Arc<dyn OcrEngine>,
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
    health_checker: Option<OcrHealthChecker>,
}

impl OcrService {
    pub fn new(engine: Arc<dyn OcrEngine>, max_concurrency: usize) -> Self {
        Self {
            engine,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            timeout: None,
            health_checker: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Refuse images whose estimated footprint exceeds available memory.
    pub fn with_memory_guard(mut self, health_checker: OcrHealthChecker) -> Self {
        self.health_checker = Some(health_checker);
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let engine: Arc<dyn OcrEngine> = match config.ocr_engine {
            EngineKind::Tesseract => Arc::new(TesseractEngine::new(config.tesseract_cmd.clone())),
            EngineKind::Paddle => Arc::new(PaddleOcrEngine::new(config.paddle_ocr_url.clone())?),
        };

        let mut service = OcrService::new(engine, config.ocr_max_concurrency);
        if let Some(seconds) = config.ocr_timeout_seconds {
            service = service.with_timeout(Duration::from_secs(seconds));
        }
        if config.ocr_memory_check {
            service = service.with_memory_guard(OcrHealthChecker::new(config.tesseract_cmd.clone()));
        }

        info!(
            "OCR service ready: engine={}, max_concurrency={}, timeout={:?}",
            service.engine_name(),
            config.ocr_max_concurrency,
            service.timeout
        );
        Ok(service)
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn recognize(&self, image: &GrayImage, language: &str) -> Result<OcrResult, OcrError> {
        validate_language_combination(language)?;

        if let Some(checker) = &self.health_checker {
            checker.validate_memory_for_image(image.width(), image.height())?;
        }

        let start = Instant::now();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| OcrError::ServiceShutDown)?;

        let waited = start.elapsed();
        if waited > Duration::from_millis(100) {
            debug!("Waited {:?} for an OCR slot", waited);
        }

        let recognition = self.engine.recognize(image, language);
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, recognition)
                .await
                .unwrap_or(Err(OcrError::OcrTimeout {
                    seconds: limit.as_secs(),
                })),
            None => recognition.await,
        };

        let mut result = match outcome {
            Ok(result) => result,
            Err(e) => {
                if e.is_configuration_error() {
                    error!(code = e.error_code(), "OCR engine {} is misconfigured: {}", self.engine.name(), e);
                } else {
                    warn!(code = e.error_code(), "OCR with {} failed: {}", self.engine.name(), e);
                }
                return Err(e);
            }
        };

        if !(0.0..=1.0).contains(&result.confidence) {
            warn!(
                "{} returned out-of-range confidence {}, clamping",
                self.engine.name(),
                result.confidence
            );
            result.confidence = if result.confidence.is_finite() {
                result.confidence.clamp(0.0, 1.0)
            } else {
                0.0
            };
        }

        info!(
            "OCR completed with {}: {} lines, {} words, {:.1}% confidence, {}ms",
            self.engine.name(),
            result.lines.len(),
            result.word_count(),
            result.confidence * 100.0,
            start.elapsed().as_millis()
        );

        Ok(result)
    }

    /// Stop accepting work. Calls already holding a slot finish normally.
    pub fn shutdown(&self) {
        self.permits.close();
        info!("OCR service shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use ocr2pdf::{
    build_router,
    config::Config,
    models::OcrResult,
    ocr::{error::OcrError, OcrEngine, OcrService},
    AppState,
};

pub const BOUNDARY: &str = "----ocr2pdf-test-boundary";

/// Engine that answers every image with the same lines and counts calls.
pub struct ScriptedEngine {
    pub lines: Vec<String>,
    pub confidence: f32,
    pub calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(lines: &[&str], confidence: f32) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            confidence,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn recognize(&self, _image: &GrayImage, _language: &str) -> Result<OcrResult, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(OcrResult {
            lines: self.lines.clone(),
            confidence: self.confidence,
            blocks: vec![],
            tables: vec![],
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub engine: Arc<ScriptedEngine>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_engine(ScriptedEngine::new(&["Hello world", "Second line"], 0.9))
    }

    pub fn with_engine(engine: ScriptedEngine) -> Self {
        let upload_dir = TempDir::new().expect("temp upload dir");
        let engine = Arc::new(engine);
        let config = test_config(&upload_dir);

        let ocr = Arc::new(OcrService::new(engine.clone(), config.ocr_max_concurrency));
        let state = Arc::new(AppState::new(config, ocr));

        Self {
            router: build_router(state),
            engine,
            upload_dir,
        }
    }

    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir.path())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

pub fn test_config(upload_dir: &TempDir) -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        upload_path: upload_dir.path().to_path_buf(),
        ocr_language: "nep".to_string(),
        ocr_memory_check: false,
        pdf_font_path: None,
        ..Config::default()
    }
}

/// A small grayscale PNG with a dark bar across a white page.
pub fn sample_png() -> Vec<u8> {
    let image = GrayImage::from_fn(120, 40, |_, y| if (15..25).contains(&y) { Luma([0]) } else { Luma([255]) });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode sample png");
    buffer.into_inner()
}

pub enum Part<'a> {
    File {
        field: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        field: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                field,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        field, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(multipart_body(parts)))
        .expect("multipart request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("get request")
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("json body")
}

//! PaddleOCR engine, reached through a PaddleHub-serving `ocr_system`
//! endpoint.
//!
//! The model (and therefore the recognition language) is fixed when the
//! serving process starts, so the language hint is only logged.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::confidence::{mean_confidence, UNIT_SCALE};
use super::error::OcrError;
use super::layout::{detect_tables, group_rows, rows_to_lines};
use super::OcrEngine;
use crate::models::{BoundingBox, OcrResult, TextBlock};
use crate::preprocess::encode_png;

const ENGINE: &str = "paddleocr";

/// Status PaddleHub serving reports for a successful prediction.
const STATUS_OK: &str = "000";

#[derive(Serialize)]
struct PredictRequest<'a> {
    images: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    msg: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<Vec<PaddleRegion>>,
}

#[derive(Debug, Deserialize)]
struct PaddleRegion {
    text: String,
    #[serde(default = "undefined_confidence")]
    confidence: f32,
    #[serde(default)]
    text_region: Vec<[f32; 2]>,
}

fn undefined_confidence() -> f32 {
    -1.0
}

pub struct PaddleOcrEngine {
    client: reqwest::Client,
    endpoint: String,
}

impl PaddleOcrEngine {
    pub fn new<S: Into<String>>(endpoint: S) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| OcrError::engine_failed(ENGINE, e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl OcrEngine for PaddleOcrEngine {
    fn name(&self) -> &'static str {
        ENGINE
    }

    async fn recognize(&self, image: &GrayImage, language: &str) -> Result<OcrResult, OcrError> {
        let png = encode_png(image).map_err(|e| OcrError::InvalidImageFormat {
            details: e.to_string(),
        })?;
        let encoded = STANDARD.encode(png);

        debug!("Posting {}x{} image to {} (language hint '{}')", image.width(), image.height(), self.endpoint, language);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&PredictRequest { images: [&encoded] })
            .send()
            .await
            .map_err(|e| OcrError::engine_failed(ENGINE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::engine_failed(
                ENGINE,
                format!("server returned {}: {}", status, body.trim()),
            ));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| OcrError::malformed(ENGINE, e.to_string()))?;

        into_result(body)
    }
}

fn into_result(body: PredictResponse) -> Result<OcrResult, OcrError> {
    if body.status != STATUS_OK {
        return Err(OcrError::engine_failed(
            ENGINE,
            format!("status {}: {}", body.status, body.msg),
        ));
    }

    let regions: Vec<PaddleRegion> = body.results.into_iter().flatten().collect();
    let scores: Vec<f32> = regions.iter().map(|r| r.confidence).collect();

    let blocks: Vec<TextBlock> = regions
        .into_iter()
        .map(|region| TextBlock {
            bbox: bounding_box(&region.text_region),
            confidence: mean_confidence([region.confidence], UNIT_SCALE),
            text: region.text,
        })
        .collect();

    let rows = group_rows(&blocks);
    let lines = rows_to_lines(&rows);
    let tables = detect_tables(&rows);

    Ok(OcrResult {
        lines,
        confidence: mean_confidence(scores, UNIT_SCALE),
        tables,
        blocks,
    })
}

/// Enclosing box of a (usually four point) text polygon.
fn bounding_box(points: &[[f32; 2]]) -> BoundingBox {
    if points.is_empty() {
        return BoundingBox { x: 0, y: 0, width: 0, height: 0 };
    }

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for [x, y] in points {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(*x);
        max_y = max_y.max(*y);
    }

    let min_x = min_x.max(0.0);
    let min_y = min_y.max(0.0);
    BoundingBox {
        x: min_x.round() as u32,
        y: min_y.round() as u32,
        width: (max_x - min_x).max(0.0).round() as u32,
        height: (max_y - min_y).max(0.0).round() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<OcrResult, OcrError> {
        into_result(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_regions_become_lines_and_blocks() {
        let result = parse(
            r#"{"msg":"","status":"000","results":[[
                {"text":"संसार","confidence":0.8,"text_region":[[120,10],[200,10],[200,30],[120,30]]},
                {"text":"नमस्ते","confidence":0.9,"text_region":[[10,12],[100,12],[100,32],[10,32]]},
                {"text":"दोस्रो","confidence":0.7,"text_region":[[10,60],[100,60],[100,80],[10,80]]}
            ]]}"#,
        )
        .unwrap();

        assert_eq!(result.lines, vec!["नमस्ते संसार", "दोस्रो"]);
        assert_eq!(result.blocks.len(), 3);
        assert_eq!(result.blocks[0].bbox, BoundingBox { x: 120, y: 10, width: 80, height: 20 });
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_empty_results_have_zero_confidence() {
        let result = parse(r#"{"msg":"","status":"000","results":[[]]}"#).unwrap();
        assert!(result.lines.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_error_status_is_engine_failure() {
        let err = parse(r#"{"msg":"model not loaded","status":"101","results":[]}"#).unwrap_err();
        assert!(err.to_string().contains("model not loaded"));
    }

    #[test]
    fn test_bounding_box_of_rotated_polygon() {
        let bbox = bounding_box(&[[12.4, 5.0], [40.0, 2.0], [42.0, 20.0], [10.0, 22.6]]);
        assert_eq!(bbox, BoundingBox { x: 10, y: 2, width: 32, height: 21 });
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Axis-aligned box in image pixel coordinates, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TextBlock {
    /// Recognized text of this region
    pub text: String,
    /// Region position in the source image
    pub bbox: BoundingBox,
    /// Engine confidence for this region, normalized to 0..=1
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Table {
    /// Cell text, row by row, left to right
    pub rows: Vec<Vec<String>>,
}

/// Output of a single recognition call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OcrResult {
    /// Recognized lines in reading order
    pub lines: Vec<String>,
    /// Mean token confidence, 0..=1
    pub confidence: f32,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl OcrResult {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|l| l.split_whitespace().count()).sum()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessResponse {
    pub success: bool,
    /// Full recognized text, lines separated by `\n`
    pub text: String,
    /// Mean recognition confidence, 0..=1
    pub confidence: f32,
    pub blocks: Vec<TextBlock>,
    pub tables: Vec<Table>,
    /// Download link for the generated PDF
    pub pdf_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub status: u16,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OcrHealthResponse {
    pub status: String,
    pub engine: String,
    pub default_language: String,
    pub tesseract_version: Option<String>,
    pub available_languages: Vec<String>,
    pub memory_available_mb: u64,
    pub errors: Vec<String>,
}

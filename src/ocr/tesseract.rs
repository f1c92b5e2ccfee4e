//! Tesseract engine, driven through its command-line interface.

use async_trait::async_trait;
use image::GrayImage;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::confidence::{mean_confidence, PERCENT_SCALE};
use super::error::OcrError;
use super::OcrEngine;
use crate::models::{BoundingBox, OcrResult, TextBlock};
use crate::preprocess::encode_png;

const ENGINE: &str = "tesseract";

/// TSV row level for individual words.
const WORD_LEVEL: u32 = 5;

pub struct TesseractEngine {
    command: String,
}

impl TesseractEngine {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, png: Vec<u8>, language: &str) -> Result<String, OcrError> {
        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", language, "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::TesseractNotInstalled,
                _ => OcrError::Io(e),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::engine_failed(ENGINE, "stdin was not captured"))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(&png).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        if let Ok(Err(e)) = writer.await {
            // Tesseract closes its stdin early on some failures; the exit
            // status below carries the real error.
            debug!("Writing image to tesseract stdin failed: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("tesseract exited with {}: {}", output.status, stderr.trim());
            if stderr.contains("Failed loading language") || stderr.contains("Error opening data file") {
                return Err(OcrError::LanguageDataNotFound {
                    lang: language.to_string(),
                });
            }
            return Err(OcrError::engine_failed(ENGINE, stderr.trim()));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| OcrError::malformed(ENGINE, format!("TSV output is not UTF-8: {}", e)))
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        ENGINE
    }

    async fn recognize(&self, image: &GrayImage, language: &str) -> Result<OcrResult, OcrError> {
        let png = encode_png(image).map_err(|e| OcrError::InvalidImageFormat {
            details: e.to_string(),
        })?;
        let tsv = self.run(png, language).await?;
        parse_tsv(&tsv)
    }
}

/// Parse `tesseract ... tsv` output.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Only word rows carry text; a `conf` of
/// `-1` means the engine has no confidence for the row.
pub fn parse_tsv(tsv: &str) -> Result<OcrResult, OcrError> {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<String>)> = Vec::new();
    let mut blocks = Vec::new();
    let mut scores = Vec::new();

    for (index, row) in tsv.lines().enumerate() {
        if row.trim().is_empty() || row.starts_with("level") {
            continue;
        }

        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 11 {
            return Err(OcrError::malformed(
                ENGINE,
                format!("row {} has {} columns", index + 1, columns.len()),
            ));
        }

        let number = |i: usize| -> Result<u32, OcrError> {
            columns[i].trim().parse::<u32>().map_err(|_| {
                OcrError::malformed(ENGINE, format!("row {} column {} is not a number", index + 1, i + 1))
            })
        };

        if number(0)? != WORD_LEVEL {
            continue;
        }

        let text = columns.get(11).map(|t| t.trim()).unwrap_or("");
        if text.is_empty() {
            continue;
        }

        let conf: f32 = columns[10].trim().parse().map_err(|_| {
            OcrError::malformed(ENGINE, format!("row {} has invalid confidence '{}'", index + 1, columns[10]))
        })?;
        scores.push(conf);

        let key = (number(1)?, number(2)?, number(3)?, number(4)?);
        match lines.last_mut() {
            Some((last, words)) if *last == key => words.push(text.to_string()),
            _ => lines.push((key, vec![text.to_string()])),
        }

        blocks.push(TextBlock {
            text: text.to_string(),
            bbox: BoundingBox {
                x: number(6)?,
                y: number(7)?,
                width: number(8)?,
                height: number(9)?,
            },
            confidence: mean_confidence([conf], PERCENT_SCALE),
        });
    }

    Ok(OcrResult {
        lines: lines.into_iter().map(|(_, words)| words.join(" ")).collect(),
        confidence: mean_confidence(scores, PERCENT_SCALE),
        blocks,
        tables: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn tsv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_words_are_grouped_into_lines() {
        let output = tsv(&[
            "1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t",
            "4\t1\t1\t1\t1\t0\t10\t10\t200\t20\t-1\t",
            "5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t96.5\tनमस्ते",
            "5\t1\t1\t1\t1\t2\t80\t10\t60\t20\t91.5\tसंसार",
            "5\t1\t1\t1\t2\t1\t10\t40\t60\t20\t88\tHello",
        ]);
        let result = parse_tsv(&output).unwrap();
        assert_eq!(result.lines, vec!["नमस्ते संसार", "Hello"]);
        assert_eq!(result.blocks.len(), 3);
        assert_eq!(result.blocks[1].bbox, BoundingBox { x: 80, y: 10, width: 60, height: 20 });
        assert!((result.confidence - 0.92).abs() < 1e-4);
    }

    #[test]
    fn test_sentinel_word_confidence_is_ignored() {
        let output = tsv(&[
            "5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t-1\tfoo",
            "5\t1\t1\t1\t1\t2\t80\t10\t60\t20\t80\tbar",
        ]);
        let result = parse_tsv(&output).unwrap();
        assert!((result.confidence - 0.8).abs() < 1e-6);
        assert_eq!(result.blocks[0].confidence, 0.0);
    }

    #[test]
    fn test_empty_output_has_zero_confidence() {
        let result = parse_tsv(HEADER).unwrap();
        assert!(result.lines.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_truncated_row_is_malformed() {
        let err = parse_tsv(&tsv(&["5\t1\t1"])).unwrap_err();
        assert_eq!(err.error_code(), "OCR_MALFORMED_OUTPUT");
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_installed() {
        let engine = TesseractEngine::new("/nonexistent/tesseract-binary");
        let image = GrayImage::new(4, 4);
        let err = engine.recognize(&image, "eng").await.unwrap_err();
        assert!(matches!(err, OcrError::TesseractNotInstalled));
    }
}

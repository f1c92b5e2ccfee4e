//! Flat single-page text PDF output.

use printpdf::{
    BuiltinFont, CustomPdfConformance, IndirectFontRef, Mm, PdfConformance, PdfDocument,
    PdfDocumentReference, Pt,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// A4 in points.
pub const PAGE_WIDTH_PT: f32 = 595.0;
pub const PAGE_HEIGHT_PT: f32 = 842.0;

pub const MARGIN_LEFT_PT: f32 = 50.0;
pub const FIRST_BASELINE_PT: f32 = 800.0;
pub const LINE_HEIGHT_PT: f32 = 20.0;
pub const MARGIN_BOTTOM_PT: f32 = 40.0;
pub const FONT_SIZE_PT: f32 = 12.0;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to load font '{path}': {reason}")]
    FontLoad { path: String, reason: String },

    #[error("Failed to build PDF: {0}")]
    Render(String),

    #[error("Failed to write PDF to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF rendering task failed: {0}")]
    Task(String),
}

/// A line placed on the page, baseline measured from the page bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x_pt: f32,
    pub y_pt: f32,
}

/// Place non-blank lines top to bottom at a fixed step.
///
/// Blank lines are skipped without advancing the cursor. Lines that would
/// sit below the bottom margin are dropped, so the output never has more
/// lines than the input and keeps their order.
pub fn layout_lines<S: AsRef<str>>(lines: &[S]) -> Vec<PlacedLine> {
    let mut placed = Vec::new();
    let mut y = FIRST_BASELINE_PT;

    for line in lines {
        let text = line.as_ref().trim_end();
        if text.trim().is_empty() {
            continue;
        }
        if y < MARGIN_BOTTOM_PT {
            break;
        }
        placed.push(PlacedLine {
            text: text.to_string(),
            x_pt: MARGIN_LEFT_PT,
            y_pt: y,
        });
        y -= LINE_HEIGHT_PT;
    }

    placed
}

#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    font_path: Option<PathBuf>,
}

impl PdfRenderer {
    /// Without a font file only text the built-in Helvetica face can show
    /// (WinAnsi) renders; anything else fails with [`PdfError::FontLoad`].
    pub fn new(font_path: Option<PathBuf>) -> Self {
        Self { font_path }
    }

    pub fn render(&self, lines: &[String], title: &str) -> Result<Vec<u8>, PdfError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm::from(Pt(PAGE_WIDTH_PT)),
            Mm::from(Pt(PAGE_HEIGHT_PT)),
            "Text",
        );
        let doc = doc.with_conformance(PdfConformance::Custom(CustomPdfConformance {
            requires_icc_profile: false,
            requires_xmp_metadata: false,
            ..Default::default()
        }));

        let placed = layout_lines(lines);
        let font = self.load_font(&doc, &placed)?;
        let layer = doc.get_page(page).get_layer(layer);

        let clipped = lines.iter().filter(|l| !l.trim().is_empty()).count().saturating_sub(placed.len());
        if clipped > 0 {
            warn!("{} line(s) fell below the page and were clipped", clipped);
        }

        for line in &placed {
            layer.use_text(
                line.text.clone(),
                FONT_SIZE_PT,
                Mm::from(Pt(line.x_pt)),
                Mm::from(Pt(line.y_pt)),
                &font,
            );
        }
        debug!("Rendered {} line(s) into '{}'", placed.len(), title);

        doc.save_to_bytes().map_err(|e| PdfError::Render(e.to_string()))
    }

    /// Render on the blocking pool and write the file, replacing any
    /// previous file of the same name.
    pub async fn render_to_file(&self, lines: Vec<String>, path: &Path) -> Result<(), PdfError> {
        let renderer = self.clone();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ocr".to_string());

        let bytes = tokio::task::spawn_blocking(move || renderer.render(&lines, &title))
            .await
            .map_err(|e| PdfError::Task(e.to_string()))??;

        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| PdfError::Write {
                path: path.display().to_string(),
                source,
            })
    }

    fn load_font(&self, doc: &PdfDocumentReference, placed: &[PlacedLine]) -> Result<IndirectFontRef, PdfError> {
        match &self.font_path {
            Some(path) => {
                let font_error = |reason: String| PdfError::FontLoad {
                    path: path.display().to_string(),
                    reason,
                };
                let data = std::fs::read(path).map_err(|e| font_error(e.to_string()))?;
                doc.add_external_font(&*data)
                    .map_err(|e| font_error(e.to_string()))
            }
            None => {
                if let Some(line) = placed.iter().find(|l| !covered_by_builtin_font(&l.text)) {
                    return Err(PdfError::FontLoad {
                        path: BUILTIN_FONT_NAME.to_string(),
                        reason: format!(
                            "no font file configured and '{}' is outside the built-in font's character set; set PDF_FONT_PATH",
                            line.text
                        ),
                    });
                }
                doc.add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| PdfError::Render(e.to_string()))
            }
        }
    }
}

const BUILTIN_FONT_NAME: &str = "Helvetica (built-in)";

/// Characters the standard Type1 faces can show: ASCII and Latin-1.
fn covered_by_builtin_font(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii() || ('\u{a0}'..='\u{ff}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_skips_blank_lines_and_steps_down() {
        let placed = layout_lines(&["first", "", "   ", "second"]);
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0], PlacedLine { text: "first".into(), x_pt: 50.0, y_pt: 800.0 });
        assert_eq!(placed[1].text, "second");
        assert_eq!(placed[1].y_pt, 780.0);
    }

    #[test]
    fn test_layout_clips_below_page_bottom() {
        let lines: Vec<String> = (0..100).map(|i| format!("line {}", i)).collect();
        let placed = layout_lines(&lines);
        assert!(placed.len() < lines.len());
        assert!(placed.iter().all(|l| l.y_pt >= MARGIN_BOTTOM_PT));
        // order preserved
        for (i, line) in placed.iter().enumerate() {
            assert_eq!(line.text, format!("line {}", i));
        }
    }

    #[test]
    fn test_layout_of_nothing_is_empty() {
        assert!(layout_lines::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_render_with_builtin_font_produces_pdf() {
        let renderer = PdfRenderer::new(None);
        let bytes = renderer
            .render(&["Hello".to_string(), "World".to_string()], "output_test")
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_builtin_font_refuses_devanagari() {
        let renderer = PdfRenderer::new(None);
        let err = renderer.render(&["नमस्ते".to_string()], "output_test").unwrap_err();
        assert!(matches!(err, PdfError::FontLoad { .. }));
    }

    #[test]
    fn test_builtin_font_covers_latin1() {
        assert!(covered_by_builtin_font("Café, naïve 100%"));
        assert!(!covered_by_builtin_font("नमस्ते"));
    }

    #[test]
    fn test_missing_font_is_fatal() {
        let renderer = PdfRenderer::new(Some(PathBuf::from("/nonexistent/font.ttf")));
        let err = renderer.render(&["Hello".to_string()], "output_test").unwrap_err();
        assert!(matches!(err, PdfError::FontLoad { .. }));
    }
}

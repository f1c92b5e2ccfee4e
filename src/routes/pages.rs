use askama::Template;
use axum::{response::Html, routing::get, Router};
use std::sync::Arc;

use crate::{errors::ProcessingError, models::Table, pipeline::ProcessedDocument, AppState};

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

/// Result page for the form flow: text lines, detected tables and the PDF
/// link. `pdf_url` is percent-encoded already and is emitted unescaped.
#[derive(Template)]
#[template(path = "result.html")]
struct ResultTemplate<'a> {
    filename: &'a str,
    language: &'a str,
    confidence_percent: String,
    lines: &'a [String],
    tables: &'a [Table],
    pdf_url: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

pub async fn index() -> Result<Html<String>, ProcessingError> {
    Ok(Html(IndexTemplate.render()?))
}

pub fn render_result(document: &ProcessedDocument) -> Result<String, askama::Error> {
    ResultTemplate {
        filename: &document.upload.filename,
        language: &document.language,
        confidence_percent: format!("{:.1}", document.ocr.confidence * 100.0),
        lines: &document.ocr.lines,
        tables: &document.ocr.tables,
        pdf_url: document.pdf_url(),
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_service::StoredFile;
    use crate::models::{OcrResult, Table};
    use std::path::PathBuf;

    fn document(lines: Vec<&str>, tables: Vec<Table>) -> ProcessedDocument {
        ProcessedDocument {
            upload: StoredFile {
                filename: "scan.png".to_string(),
                path: PathBuf::from("/tmp/scan.png"),
                size: 10,
            },
            language: "nep".to_string(),
            ocr: OcrResult {
                lines: lines.into_iter().map(String::from).collect(),
                confidence: 0.875,
                blocks: vec![],
                tables,
            },
            pdf_filename: "output_scan.png.pdf".to_string(),
            pdf_path: PathBuf::from("/tmp/output_scan.png.pdf"),
        }
    }

    #[test]
    fn test_result_page_contains_text_and_link() {
        let html = render_result(&document(vec!["नमस्ते", "<script>"], vec![])).unwrap();
        assert!(html.contains("<p>नमस्ते</p>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("href=\"/download/output_scan.png.pdf\""));
        assert!(html.contains("87.5%"));
    }

    #[test]
    fn test_result_page_renders_tables() {
        let table = Table {
            rows: vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]],
        };
        let html = render_result(&document(vec![], vec![table])).unwrap();
        assert!(html.contains("No text recognized"));
        assert!(html.contains("<td>a</td><td>b</td>"));
    }
}

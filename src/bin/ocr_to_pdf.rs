use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;

use ocr2pdf::{
    config::Config,
    file_service::FileService,
    ocr::{EngineKind, OcrService},
    pdf::PdfRenderer,
    pipeline::DocumentProcessor,
};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("ocr_to_pdf")
        .about("Recognize text in an image and write it to a PDF")
        .arg(
            Arg::new("input")
                .help("Image to recognize")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .help("PDF to write (defaults to output_<input>.pdf next to the image)")
                .index(2),
        )
        .arg(
            Arg::new("language")
                .help("Tesseract language code(s), e.g. nep or nep+eng")
                .long("language")
                .short('l')
                .value_name("LANG"),
        )
        .arg(
            Arg::new("engine")
                .help("OCR engine: tesseract or paddle")
                .long("engine")
                .short('e')
                .value_name("ENGINE"),
        )
        .arg(
            Arg::new("font")
                .help("TrueType font used for the PDF text")
                .long("font")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("print")
                .help("Also print the recognized text to stdout")
                .long("print")
                .short('p')
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let mut config = Config::from_env()?;
    if let Some(engine) = matches.get_one::<String>("engine") {
        config.ocr_engine = engine.parse::<EngineKind>()?;
    }
    if let Some(font) = matches.get_one::<String>("font") {
        config.pdf_font_path = Some(PathBuf::from(font));
    }
    let language = matches
        .get_one::<String>("language")
        .cloned()
        .unwrap_or_else(|| config.ocr_language.clone());

    let input = matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .context("input image is required")?;
    if !input.is_file() {
        anyhow::bail!("input image does not exist: {}", input.display());
    }

    let output = match matches.get_one::<String>("output") {
        Some(path) => PathBuf::from(path),
        None => {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .context("input has no file name")?;
            input.with_file_name(format!("output_{}.pdf", name))
        }
    };

    let ocr = Arc::new(OcrService::from_config(&config)?);
    let files = FileService::new(
        config.upload_path.clone(),
        config.allowed_file_types.clone(),
        config.max_upload_bytes,
    );
    let processor = DocumentProcessor::new(
        files,
        ocr.clone(),
        PdfRenderer::new(config.pdf_font_path.clone()),
        config.ocr_language.clone(),
    );

    let result = processor
        .process_image_file(&input, &output, &language)
        .await
        .with_context(|| format!("failed to convert {}", input.display()))?;
    ocr.shutdown();

    if matches.get_flag("print") {
        println!("{}", result.text());
    }
    eprintln!(
        "Wrote {} ({} lines, confidence {:.2})",
        output.display(),
        result.lines.len(),
        result.confidence
    );

    Ok(())
}

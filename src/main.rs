use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ocr2pdf::{
    build_router,
    config::Config,
    ocr::{health::OcrHealthChecker, EngineKind, OcrService},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tokio::fs::create_dir_all(config.upload_dir()).await?;

    if config.ocr_engine == EngineKind::Tesseract {
        let checker = OcrHealthChecker::new(config.tesseract_cmd.clone());
        let language = config.ocr_language.clone();
        let report = tokio::task::spawn_blocking(move || {
            checker
                .check_tesseract_installation()
                .and_then(|version| checker.check_language_data(&language).map(|_| version))
        })
        .await?;
        match report {
            Ok(version) => info!("Tesseract {} ready", version),
            Err(e) => warn!("Tesseract is not ready, OCR requests will fail: {}", e),
        }
    }

    let ocr = Arc::new(OcrService::from_config(&config)?);
    let state = Arc::new(AppState::new(config.clone(), ocr.clone()));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    info!("Server starting on {}", config.server_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await?;

    ocr.shutdown();
    Ok(())
}

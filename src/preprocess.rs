use image::{DynamicImage, GrayImage, ImageError, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Could not decode image '{path}': {source}")]
    ImageLoad {
        path: String,
        #[source]
        source: ImageError,
    },

    #[error("Could not encode grayscale image: {0}")]
    Encode(#[source] ImageError),

    #[error("Image preprocessing task failed: {0}")]
    Task(String),
}

/// Load the file at `path` and convert it to 8-bit grayscale.
///
/// The format is sniffed from the file contents, so a mislabeled extension
/// still decodes. No other processing is applied.
pub async fn load_grayscale(path: &Path) -> Result<GrayImage, PreprocessError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || load_grayscale_blocking(&path))
        .await
        .map_err(|e| PreprocessError::Task(e.to_string()))?
}

pub fn load_grayscale_blocking(path: &Path) -> Result<GrayImage, PreprocessError> {
    let load_error = |source: ImageError| PreprocessError::ImageLoad {
        path: path.display().to_string(),
        source,
    };

    let image = ImageReader::open(path)
        .map_err(|e| load_error(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| load_error(ImageError::IoError(e)))?
        .decode()
        .map_err(load_error)?;

    debug!(
        "Decoded {} as {}x{} {:?}",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );

    Ok(to_grayscale(image))
}

pub fn to_grayscale(image: DynamicImage) -> GrayImage {
    image.into_luma8()
}

/// PNG bytes for engines that take an encoded image rather than pixels.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(PreprocessError::Encode)?;
    Ok(buffer)
}

use axum::body::Bytes;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Prefix of every generated PDF's filename.
pub const PDF_PREFIX: &str = "output_";

/// Stem used when nothing of the client's filename survives sanitizing.
const FALLBACK_STEM: &str = "upload";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file part in the request")]
    MissingFile,

    #[error("No selected file")]
    EmptyFilename,

    #[error("Invalid file type: '{filename}'")]
    InvalidFileType { filename: String },

    #[error("Invalid filename: '{filename}'")]
    InvalidFilename { filename: String },

    #[error("File of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("Request body exceeds the {max} byte limit")]
    BodyTooLarge { max: usize },

    #[error("Malformed multipart request: {message}")]
    Malformed { message: String },

    #[error("File not found: {filename}")]
    NotFound { filename: String },

    #[error("Storage error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

/// An upload after it has been written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Sanitized name, unique within the upload directory
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"))
}

/// Reduce a client-supplied name to `[A-Za-z0-9_.-]`.
///
/// Only the last path component is kept (both `/` and `\` count as
/// separators), whitespace runs become `_`, every other character outside
/// the safe set is dropped, and leading or trailing `.`/`_` are stripped.
/// The result may be empty.
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let joined = last.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = unsafe_chars().replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

fn split_extension(filename: &str) -> Option<(&str, &str)> {
    let (stem, extension) = filename.rsplit_once('.')?;
    if extension.is_empty() {
        None
    } else {
        Some((stem, extension))
    }
}

#[derive(Clone, Debug)]
pub struct FileService {
    upload_path: PathBuf,
    allowed_file_types: Vec<String>,
    max_file_size: usize,
}

impl FileService {
    pub fn new<P: Into<PathBuf>>(upload_path: P, allowed_file_types: Vec<String>, max_file_size: usize) -> Self {
        Self {
            upload_path: upload_path.into(),
            allowed_file_types,
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn is_allowed_file_type(&self, filename: &str) -> bool {
        let last = filename.rsplit(['/', '\\']).next().unwrap_or("");
        match split_extension(last) {
            Some((_, extension)) => {
                let ext_lower = extension.to_lowercase();
                self.allowed_file_types.iter().any(|allowed| *allowed == ext_lower)
            }
            None => false,
        }
    }

    /// Check the declared name and size and return the name the file will
    /// be stored under.
    pub fn validate(&self, filename: &str, size: usize) -> Result<String, UploadError> {
        if filename.trim().is_empty() {
            return Err(UploadError::EmptyFilename);
        }
        if !self.is_allowed_file_type(filename) {
            return Err(UploadError::InvalidFileType {
                filename: filename.to_string(),
            });
        }
        if size > self.max_file_size {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }

        let last = filename.rsplit(['/', '\\']).next().unwrap_or("");
        let (stem, extension) = split_extension(last).ok_or_else(|| UploadError::InvalidFilename {
            filename: filename.to_string(),
        })?;

        // A stem in a non-Latin script sanitizes to nothing; keep the
        // already validated extension so the stored file stays usable.
        let stem = sanitize_filename(stem);
        let stem = if stem.is_empty() { FALLBACK_STEM } else { stem.as_str() };
        let extension = sanitize_filename(extension);
        if extension.is_empty() {
            return Err(UploadError::InvalidFilename {
                filename: filename.to_string(),
            });
        }

        Ok(format!("{}.{}", stem, extension))
    }

    /// Validate and write an upload, replacing any earlier file of the same
    /// name. Nothing is written when validation fails.
    pub async fn save_upload(&self, upload: &UploadedFile) -> Result<StoredFile, UploadError> {
        let filename = self.validate(&upload.filename, upload.data.len())?;
        let path = self.upload_path.join(&filename);

        let io_error = |source: std::io::Error| UploadError::Io {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.upload_path).await.map_err(io_error)?;
        fs::write(&path, &upload.data).await.map_err(io_error)?;

        info!("Stored upload '{}' as {} ({} bytes)", upload.filename, path.display(), upload.data.len());

        Ok(StoredFile {
            filename,
            path: path.clone(),
            size: upload.data.len(),
        })
    }

    pub fn pdf_filename_for(&self, stored_filename: &str) -> String {
        format!("{}{}.pdf", PDF_PREFIX, stored_filename)
    }

    pub fn path_for(&self, stored_filename: &str) -> PathBuf {
        self.upload_path.join(stored_filename)
    }

    /// Map a download request onto a file in the upload directory.
    ///
    /// Only names that are already in sanitized form are accepted, so the
    /// lookup can never leave the upload directory.
    pub async fn resolve_download(&self, requested: &str) -> Result<PathBuf, UploadError> {
        if requested.is_empty() || sanitize_filename(requested) != requested {
            return Err(UploadError::InvalidFilename {
                filename: requested.to_string(),
            });
        }

        let path = self.upload_path.join(requested);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(UploadError::NotFound {
                filename: requested.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(UploadError::NotFound {
                filename: requested.to_string(),
            }),
            Err(source) => Err(UploadError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub async fn read_file(&self, path: &Path) -> Result<Vec<u8>, UploadError> {
        debug!("Reading {}", path.display());
        fs::read(path).await.map_err(|source| UploadError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service(dir: &Path) -> FileService {
        FileService::new(
            dir,
            vec!["png".into(), "jpg".into(), "jpeg".into(), "tiff".into(), "pdf".into()],
            1024,
        )
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(sanitize_filename("../../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\scan 1.png"), "scan_1.png");
        assert_eq!(sanitize_filename("i contain cool \u{00fc}ml\u{00e4}uts.txt"), "i_contain_cool_mluts.txt");
        assert_eq!(sanitize_filename("..."), "");
        assert_eq!(sanitize_filename("__init__.py"), "init__.py");
    }

    #[test]
    fn test_allowed_file_types() {
        let dir = TempDir::new().unwrap();
        let service = service(dir.path());
        assert!(service.is_allowed_file_type("sample.png"));
        assert!(service.is_allowed_file_type("SCAN.JPEG"));
        assert!(service.is_allowed_file_type("dir/page.tiff"));
        assert!(!service.is_allowed_file_type("malware.exe"));
        assert!(!service.is_allowed_file_type("png"));
        assert!(!service.is_allowed_file_type("image.png.exe"));
        assert!(!service.is_allowed_file_type("trailing."));
    }

    #[test]
    fn test_validate_rejections() {
        let dir = TempDir::new().unwrap();
        let service = service(dir.path());
        assert!(matches!(service.validate("", 10), Err(UploadError::EmptyFilename)));
        assert!(matches!(service.validate("malware.exe", 10), Err(UploadError::InvalidFileType { .. })));
        assert!(matches!(service.validate("big.png", 2048), Err(UploadError::TooLarge { size: 2048, max: 1024 })));
    }

    #[test]
    fn test_non_latin_stem_falls_back() {
        let dir = TempDir::new().unwrap();
        let service = service(dir.path());
        assert_eq!(service.validate("चित्र.png", 10).unwrap(), "upload.png");
        assert_eq!(service.validate("../scan.PNG", 10).unwrap(), "scan.PNG");
    }

    #[tokio::test]
    async fn test_save_upload_writes_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir.path().join("uploads"));

        let first = UploadedFile { filename: "page one.png".into(), data: Bytes::from_static(b"first") };
        let stored = service.save_upload(&first).await.unwrap();
        assert_eq!(stored.filename, "page_one.png");
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"first");

        let second = UploadedFile { filename: "page one.png".into(), data: Bytes::from_static(b"second") };
        let again = service.save_upload(&second).await.unwrap();
        assert_eq!(again.path, stored.path);
        assert_eq!(std::fs::read(&again.path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let service = service(dir.path());
        let upload = UploadedFile { filename: "malware.exe".into(), data: Bytes::from_static(b"MZ") };

        assert!(service.save_upload(&upload).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_download() {
        let dir = TempDir::new().unwrap();
        let service = service(dir.path());
        std::fs::write(dir.path().join("output_a.png.pdf"), b"%PDF").unwrap();

        assert!(service.resolve_download("output_a.png.pdf").await.is_ok());
        assert!(matches!(
            service.resolve_download("missing.pdf").await,
            Err(UploadError::NotFound { .. })
        ));
        assert!(matches!(
            service.resolve_download("../secret.txt").await,
            Err(UploadError::InvalidFilename { .. })
        ));
        assert!(matches!(
            service.resolve_download("..").await,
            Err(UploadError::InvalidFilename { .. })
        ));
    }

    #[test]
    fn test_pdf_filename() {
        let dir = TempDir::new().unwrap();
        assert_eq!(service(dir.path()).pdf_filename_for("sample.png"), "output_sample.png.pdf");
    }
}

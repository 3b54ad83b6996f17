use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the reader core.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Local book file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No extractor exists for the detected format.
    #[error("Unsupported format: .{0}")]
    UnsupportedFormat(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF rasterization error.
    #[error("Render error: {0}")]
    Render(String),

    /// ZIP archive error.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Progress database error.
    #[error("Database error: {0}")]
    Database(String),

    /// No signed-in user for an operation that needs one.
    #[error("Not signed in")]
    Unauthenticated,

    /// Blob storage transfer error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure category surfaced by a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Local file missing.
    NotFound,
    /// Format has no extractor.
    UnsupportedFormat,
    /// Read or decompress failure.
    Io,
    /// PDF rasterization failure.
    Render,
    /// Corrupt archive.
    Archive,
    /// Anything else, including extractor panics.
    Internal,
}

pub(crate) const GENERIC_FAILURE_MESSAGE: &str = "Failed to open the file. Please try again.";

impl ReaderError {
    /// Category used by the load controller.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ReaderError::NotFound(_) => FailureKind::NotFound,
            ReaderError::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            ReaderError::Io(_) => FailureKind::Io,
            ReaderError::Render(_) => FailureKind::Render,
            ReaderError::Archive(_) => FailureKind::Archive,
            _ => FailureKind::Internal,
        }
    }

    /// Message safe to show to the reader; never includes internal detail.
    pub fn user_message(&self) -> String {
        match self {
            ReaderError::NotFound(_) => {
                "The local file was not found. It may have been deleted.".to_string()
            }
            ReaderError::UnsupportedFormat(ext) => format!(
                "Format .{} is not supported yet. Available formats: .txt, .pdf, .epub.",
                ext
            ),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ReaderError {
    fn from(e: rusqlite::Error) -> Self {
        ReaderError::Database(e.to_string())
    }
}

/// Result type alias for the reader core.
pub type Result<T> = std::result::Result<T, ReaderError>;

//! Error types shared by the hashing and transcoding components

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for csvjob-common operations
pub type Result<T> = std::result::Result<T, CsvJobError>;

/// Main error type for file-level operations
#[derive(Error, Debug)]
pub enum CsvJobError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Error parsing CSV: {0}")]
    Csv(#[from] csv_async::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CsvJobError {
    /// Map an IO error for `path`, keeping missing files distinguishable
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path.into())
        } else {
            Self::Io(err)
        }
    }

    /// Whether the error was caused by a missing file
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(_))
    }
}

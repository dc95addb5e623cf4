//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The path is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The filename cannot be stored as a single directory entry.
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    /// The timestamp cannot be represented as a file time.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    /// Moving a completed temporary file into place failed.
    #[error("failed to persist {name}: {source}")]
    Persist {
        /// Target filename.
        name: String,
        /// Underlying error.
        source: io::Error,
    },
}

impl StorageError {
    /// Returns true if the error means the file is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::NotFound(_) => true,
            StorageError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        assert!(StorageError::NotFound("a".into()).is_not_found());
        assert!(StorageError::Io(io::Error::from(io::ErrorKind::NotFound)).is_not_found());
        assert!(!StorageError::InvalidFilename("..".into()).is_not_found());
    }
}

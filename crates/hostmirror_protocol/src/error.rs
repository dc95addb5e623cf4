//! Error types for protocol values.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur when building or decoding protocol values.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Host identifier is not a single path component.
    #[error("invalid host id: {0:?}")]
    InvalidHostId(String),

    /// Filename is not a single path component.
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

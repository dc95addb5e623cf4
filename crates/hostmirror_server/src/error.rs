//! Error types for the mirror server.

use hostmirror_protocol::{HostId, ProtocolError};
use hostmirror_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the mirror server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// No table entry for the requested host.
    #[error("unknown host: {0}")]
    UnknownHost(HostId),

    /// The requested file is not stored for the host.
    #[error("file not found: {host}/{filename}")]
    FileNotFound {
        /// Host the file was requested for.
        host: HostId,
        /// Requested filename.
        filename: String,
    },

    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The storage root is unusable. Fatal at startup.
    #[error("storage root {} is not a directory", .0.display())]
    Config(PathBuf),

    /// The filesystem watcher could not be set up.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::UnknownHost(_)
                | ServerError::FileNotFound { .. }
                | ServerError::InvalidRequest(_)
                | ServerError::Protocol(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns true if the error means "no such host or file".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServerError::UnknownHost(_) | ServerError::FileNotFound { .. }
        )
    }
}

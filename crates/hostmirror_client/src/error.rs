//! Error types for the sync client.

use hostmirror_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Unknown host, or a file that vanished between listing and fetch.
    #[error("not found: {0}")]
    NotFound(String),

    /// Server rejected the request.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the server.
        message: String,
    },

    /// Response could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A background task failed to complete.
    #[error("internal error: {0}")]
    Internal(String),

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Server { status, .. } => *status >= 500,
            SyncError::NotFound(_) | SyncError::Storage(_) => true,
            _ => false,
        }
    }

    /// Returns true if this error means "no such host or file".
    pub fn is_not_found(&self) -> bool {
        match self {
            SyncError::NotFound(_) => true,
            SyncError::Storage(e) => e.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::transport_retryable("connection lost").is_retryable());
        assert!(!SyncError::transport_fatal("bad url").is_retryable());
        assert!(SyncError::Server {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!SyncError::Server {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!SyncError::Cancelled.is_retryable());
        assert!(!SyncError::Internal("task panicked".into()).is_retryable());
    }

    #[test]
    fn not_found_classification() {
        assert!(SyncError::NotFound("alpha".into()).is_not_found());
        assert!(SyncError::Storage(StorageError::NotFound("a".into())).is_not_found());
        assert!(!SyncError::Cancelled.is_not_found());
    }

    #[test]
    fn error_display() {
        let err = SyncError::Server {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "server error (500): boom");
        assert_eq!(SyncError::Cancelled.to_string(), "sync cancelled");
        assert_eq!(
            SyncError::Internal("task panicked".into()).to_string(),
            "internal error: task panicked"
        );
    }
}

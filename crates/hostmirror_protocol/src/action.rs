//! Sync actions produced by reconciliation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of convergence work for a single filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    /// Fetch the file and stamp it with the remote mtime.
    Download {
        /// File to fetch.
        filename: String,
        /// Remote mtime to apply after a successful write.
        expected_mtime: f64,
    },
    /// Remove the local file.
    Delete {
        /// File to remove.
        filename: String,
    },
}

impl SyncAction {
    /// Creates a download action.
    pub fn download(filename: impl Into<String>, expected_mtime: f64) -> Self {
        SyncAction::Download {
            filename: filename.into(),
            expected_mtime,
        }
    }

    /// Creates a delete action.
    pub fn delete(filename: impl Into<String>) -> Self {
        SyncAction::Delete {
            filename: filename.into(),
        }
    }

    /// Returns the filename this action applies to.
    pub fn filename(&self) -> &str {
        match self {
            SyncAction::Download { filename, .. } | SyncAction::Delete { filename } => filename,
        }
    }

    /// Returns true for download actions.
    pub fn is_download(&self) -> bool {
        matches!(self, SyncAction::Download { .. })
    }

    /// Returns true for delete actions.
    pub fn is_delete(&self) -> bool {
        matches!(self, SyncAction::Delete { .. })
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Download {
                filename,
                expected_mtime,
            } => write!(f, "download {filename} @ {expected_mtime}"),
            SyncAction::Delete { filename } => write!(f, "delete {filename}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let download = SyncAction::download("a.txt", 150.0);
        assert_eq!(download.filename(), "a.txt");
        assert!(download.is_download());
        assert!(!download.is_delete());

        let delete = SyncAction::delete("b.txt");
        assert_eq!(delete.filename(), "b.txt");
        assert!(delete.is_delete());
    }

    #[test]
    fn display() {
        assert_eq!(SyncAction::delete("x").to_string(), "delete x");
        assert_eq!(
            SyncAction::download("y", 1.5).to_string(),
            "download y @ 1.5"
        );
    }
}

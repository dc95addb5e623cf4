//! In-memory local store for testing.

use crate::error::{StorageError, StorageResult};
use crate::scan::system_time_to_secs;
use crate::store::LocalStore;
use hostmirror_protocol::{validate_filename, VersionMap};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

#[derive(Debug, Clone)]
struct StoredFile {
    data: Vec<u8>,
    mtime: f64,
}

/// An in-memory local store.
///
/// Suitable for unit and integration tests of the sync loop. Individual
/// filenames can be marked as failing to exercise per-action error handling.
///
/// # Example
///
/// ```rust
/// use hostmirror_storage::{InMemoryStore, LocalStore};
///
/// let store = InMemoryStore::new();
/// store.insert("a.txt", b"data", 10.0);
/// assert!(store.delete_file("a.txt").unwrap());
/// assert!(store.scan().unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    files: RwLock<BTreeMap<String, StoredFile>>,
    failing: RwLock<BTreeSet<String>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file with an explicit mtime.
    pub fn insert(&self, name: impl Into<String>, data: &[u8], mtime: f64) {
        self.files.write().insert(
            name.into(),
            StoredFile {
                data: data.to_vec(),
                mtime,
            },
        );
    }

    /// Makes every write and delete of `name` fail with an I/O error.
    pub fn fail_on(&self, name: impl Into<String>) {
        self.failing.write().insert(name.into());
    }

    /// Returns a copy of a file's content, if present.
    #[must_use]
    pub fn content(&self, name: &str) -> Option<Vec<u8>> {
        self.files.read().get(name).map(|f| f.data.clone())
    }

    fn check(&self, name: &str) -> StorageResult<()> {
        validate_filename(name).map_err(|_| StorageError::InvalidFilename(name.to_string()))?;
        if self.failing.read().contains(name) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("injected failure for {name}"),
            )));
        }
        Ok(())
    }
}

impl LocalStore for InMemoryStore {
    fn scan(&self) -> StorageResult<VersionMap> {
        Ok(self
            .files
            .read()
            .iter()
            .map(|(name, file)| (name.as_str(), file.mtime))
            .collect())
    }

    fn read_file(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.content(name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn write_file(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        self.check(name)?;
        self.insert(name, data, system_time_to_secs(SystemTime::now()));
        Ok(())
    }

    fn set_mtime(&self, name: &str, mtime: f64) -> StorageResult<()> {
        match self.files.write().get_mut(name) {
            Some(file) => {
                file.mtime = mtime;
                Ok(())
            }
            None => Err(StorageError::NotFound(name.to_string())),
        }
    }

    fn delete_file(&self, name: &str) -> StorageResult<bool> {
        self.check(name)?;
        Ok(self.files.write().remove(name).is_some())
    }
}

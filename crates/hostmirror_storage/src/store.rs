//! Local store trait definition.

use crate::error::StorageResult;
use hostmirror_protocol::VersionMap;

/// The client's view of its mirrored directory.
///
/// Stores hold flat sets of named files. The sync loop only talks to a store
/// through this trait, so tests can substitute an in-memory implementation.
///
/// # Invariants
///
/// - `scan` reflects every completed `write_file`, `set_mtime` and
///   `delete_file`
/// - `write_file` either replaces the file completely or leaves the previous
///   content (or absence) in place
/// - Stores must be `Send + Sync` so the sync loop can own them in a task
pub trait LocalStore: Send + Sync {
    /// Returns a snapshot of the files currently present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed.
    fn scan(&self) -> StorageResult<VersionMap>;

    /// Reads a file's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is absent or cannot be read.
    fn read_file(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Atomically replaces (or creates) a file with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the write fails. A failed
    /// write leaves no partial file behind.
    fn write_file(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Sets a file's modification time.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is absent or the timestamp is invalid.
    fn set_mtime(&self, name: &str, mtime: f64) -> StorageResult<()>;

    /// Removes a file.
    ///
    /// Returns `false` if the file was already absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or removal fails.
    fn delete_file(&self, name: &str) -> StorageResult<bool>;

    /// Removes leftovers of writes that never completed, such as temp files
    /// from a process killed mid-write.
    ///
    /// Returns how many entries were removed. Must not run concurrently
    /// with `write_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed or an entry cannot be
    /// removed.
    fn remove_stale_temp_files(&self) -> StorageResult<usize> {
        Ok(0)
    }
}

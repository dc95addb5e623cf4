//! Directory-backed local store.

use crate::error::{StorageError, StorageResult};
use crate::scan::{scan_dir, secs_to_system_time, TEMP_PREFIX};
use crate::store::LocalStore;
use filetime::FileTime;
use hostmirror_protocol::{validate_filename, VersionMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A local store backed by one directory on the filesystem.
///
/// # Durability
///
/// `write_file` writes into a temporary file in the same directory, syncs
/// it, then renames it over the target. Readers never see a partially
/// written file, and a failed write leaves the previous content in place.
///
/// # Example
///
/// ```no_run
/// use hostmirror_storage::{DirStore, LocalStore};
/// use std::path::Path;
///
/// let store = DirStore::open_with_create_dirs(Path::new("clientfiles")).unwrap();
/// store.write_file("motd", b"hello\n").unwrap();
/// store.set_mtime("motd", 1_700_000_000.0).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Opens an existing directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotADirectory`] if the path does not name a
    /// directory.
    pub fn open(root: &Path) -> StorageResult<Self> {
        if !root.is_dir() {
            return Err(StorageError::NotADirectory(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Opens a directory, creating it and its parents if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_create_dirs(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        Self::open(root)
    }

    /// Returns the directory this store manages.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path a filename maps to, rejecting names that would escape
    /// the directory.
    fn path_for(&self, name: &str) -> StorageResult<PathBuf> {
        validate_filename(name).map_err(|_| StorageError::InvalidFilename(name.to_string()))?;
        Ok(self.root.join(name))
    }
}

impl LocalStore for DirStore {
    fn scan(&self) -> StorageResult<VersionMap> {
        scan_dir(&self.root)
    }

    fn read_file(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(data) => Ok(data),
            // A subdirectory is not one of the store's files.
            Err(e) if e.kind() == io::ErrorKind::NotFound || path.is_dir() => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_file(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.path_for(name)?;

        // The temp file is removed on drop if anything below fails.
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;

        tmp.persist(&path).map_err(|e| StorageError::Persist {
            name: name.to_string(),
            source: e.error,
        })?;
        Ok(())
    }

    fn set_mtime(&self, name: &str, mtime: f64) -> StorageResult<()> {
        let path = self.path_for(name)?;
        let time = FileTime::from_system_time(secs_to_system_time(mtime)?);
        match filetime::set_file_mtime(&path, time) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete_file(&self, name: &str) -> StorageResult<bool> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_stale_temp_files(&self) -> StorageResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let is_temp = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(TEMP_PREFIX));
            if !is_temp || !entry.file_type()?.is_file() {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(path = %entry.path().display(), "removed stale temp file");
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_requires_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            DirStore::open(&file),
            Err(StorageError::NotADirectory(_))
        ));
        assert!(matches!(
            DirStore::open(&dir.path().join("missing")),
            Err(StorageError::NotADirectory(_))
        ));
    }

    #[test]
    fn open_with_create_dirs_creates() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("a").join("b");
        let store = DirStore::open_with_create_dirs(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.write_file("a.txt", b"first").unwrap();
        store.write_file("a.txt", b"second").unwrap();
        assert_eq!(store.read_file("a.txt").unwrap(), b"second");
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.write_file("a.txt", b"data").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[test]
    fn failed_write_keeps_previous_content() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.write_file("a.txt", b"old").unwrap();

        // A directory in the way makes the final rename fail.
        fs::create_dir(dir.path().join("blocked")).unwrap();
        fs::write(dir.path().join("blocked").join("inner"), b"x").unwrap();
        assert!(store.write_file("blocked", b"new").is_err());

        assert_eq!(store.read_file("a.txt").unwrap(), b"old");
        assert_eq!(store.scan().unwrap().len(), 1);
    }

    #[test]
    fn set_mtime_is_visible_to_scan() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.write_file("a.txt", b"data").unwrap();
        store.set_mtime("a.txt", 1_600_000_000.75).unwrap();

        assert_eq!(store.scan().unwrap().get("a.txt"), Some(1_600_000_000.75));
    }

    #[test]
    fn set_mtime_missing_file() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        assert!(store.set_mtime("missing", 1.0).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_reports_presence() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.write_file("a.txt", b"data").unwrap();

        assert!(store.delete_file("a.txt").unwrap());
        assert!(!store.delete_file("a.txt").unwrap());
        assert!(store.scan().unwrap().is_empty());
    }

    #[test]
    fn rejects_escaping_names() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        for bad in ["../x", "..", "a/b", ""] {
            assert!(matches!(
                store.write_file(bad, b"x"),
                Err(StorageError::InvalidFilename(_))
            ));
            assert!(matches!(
                store.delete_file(bad),
                Err(StorageError::InvalidFilename(_))
            ));
        }
    }

    #[test]
    fn read_directory_is_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        let err = store.read_file("sub").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn stale_temp_files_are_swept() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.write_file("keep.txt", b"data").unwrap();
        fs::write(dir.path().join(format!("{TEMP_PREFIX}a1b2c3")), b"half").unwrap();
        fs::write(dir.path().join(format!("{TEMP_PREFIX}d4e5f6")), b"").unwrap();
        fs::create_dir(dir.path().join(format!("{TEMP_PREFIX}dir"))).unwrap();

        assert_eq!(store.remove_stale_temp_files().unwrap(), 2);
        assert_eq!(store.remove_stale_temp_files().unwrap(), 0);

        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec![format!("{TEMP_PREFIX}dir"), "keep.txt".to_string()]);
        assert_eq!(store.read_file("keep.txt").unwrap(), b"data");
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.read_file("nope"),
            Err(StorageError::NotFound(_))
        ));
    }
}

//! Flat directory scanning.

use crate::error::{StorageError, StorageResult};
use hostmirror_protocol::VersionMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Prefix of in-flight temporary files created by atomic writes.
///
/// Entries with this prefix are never reported by [`scan_dir`].
pub const TEMP_PREFIX: &str = ".hostmirror-";

/// Converts a file time to fractional seconds since the Unix epoch.
pub fn system_time_to_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

/// Converts fractional seconds since the Unix epoch to a file time.
///
/// # Errors
///
/// Returns [`StorageError::InvalidTimestamp`] for NaN, infinite or
/// out-of-range values.
pub fn secs_to_system_time(secs: f64) -> StorageResult<SystemTime> {
    let offset =
        Duration::try_from_secs_f64(secs.abs()).map_err(|_| StorageError::InvalidTimestamp(secs))?;
    let time = if secs >= 0.0 {
        UNIX_EPOCH.checked_add(offset)
    } else {
        UNIX_EPOCH.checked_sub(offset)
    };
    time.ok_or(StorageError::InvalidTimestamp(secs))
}

/// Scans a directory and returns one entry per regular file directly inside it.
///
/// Subdirectories are not descended into. Entries that cannot be stat'ed,
/// have non-UTF-8 names, or are temporary files of an in-flight write are
/// skipped.
///
/// # Errors
///
/// Returns an error if the directory itself cannot be listed.
pub fn scan_dir(path: &Path) -> StorageResult<VersionMap> {
    let entries = fs::read_dir(path)?;
    let mut map = VersionMap::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(dir = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                debug!(dir = %path.display(), name = ?raw, "skipping non-UTF-8 filename");
                continue;
            }
        };

        if name.starts_with(TEMP_PREFIX) {
            continue;
        }

        // Follow symlinks so a link to a regular file counts as that file.
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(file = %name, error = %e, "skipping entry without metadata");
                continue;
            }
        };

        if !metadata.is_file() {
            continue;
        }

        match metadata.modified() {
            Ok(modified) => {
                map.insert(name, system_time_to_secs(modified));
            }
            Err(e) => debug!(file = %name, error = %e, "skipping entry without mtime"),
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::tempdir;

    #[test]
    fn scan_lists_regular_files_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), b"c").unwrap();

        let map = scan_dir(dir.path()).unwrap();
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn scan_reports_mtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"a").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000, 500_000_000)).unwrap();

        let map = scan_dir(dir.path()).unwrap();
        assert_eq!(map.get("a.txt"), Some(1_700_000_000.5));
    }

    #[test]
    fn scan_skips_temp_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(format!("{TEMP_PREFIX}partial")), b"x").unwrap();
        fs::write(dir.path().join("real"), b"x").unwrap();

        let map = scan_dir(dir.path()).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains("real"));
    }

    #[test]
    fn scan_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(scan_dir(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn scan_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let result = scan_dir(&dir.path().join("missing"));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[test]
    fn timestamp_conversion_roundtrip() {
        let time = secs_to_system_time(1_700_000_000.25).unwrap();
        assert_eq!(system_time_to_secs(time), 1_700_000_000.25);

        let before_epoch = secs_to_system_time(-10.0).unwrap();
        assert_eq!(system_time_to_secs(before_epoch), -10.0);
    }

    #[test]
    fn invalid_timestamps_rejected() {
        assert!(secs_to_system_time(f64::NAN).is_err());
        assert!(secs_to_system_time(f64::INFINITY).is_err());
    }
}

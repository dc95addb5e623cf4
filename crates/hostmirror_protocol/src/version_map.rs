//! File freshness records and per-host version maps.

use crate::error::ProtocolResult;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// A single file's freshness record.
///
/// `mtime` is seconds since the Unix epoch with fractional precision. It is
/// used purely as a "last changed at" signal, never as wall-clock truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Filename, unique within its version map.
    pub name: String,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: f64,
}

impl FileRecord {
    /// Creates a new file record.
    pub fn new(name: impl Into<String>, mtime: f64) -> Self {
        Self {
            name: name.into(),
            mtime,
        }
    }
}

/// Mapping from filename to modification time for one host.
///
/// A version map is a value snapshot, not a live view: it must be rebuilt to
/// observe change. Absence of a key means the file does not exist in this
/// view. Entries iterate in filename order, so anything derived from a map is
/// deterministic.
///
/// On the wire a version map is a JSON object of `filename: mtime` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionMap {
    entries: BTreeMap<String, f64>,
}

impl VersionMap {
    /// Creates an empty version map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the mtime for a file.
    ///
    /// Returns the previous mtime, if any.
    pub fn insert(&mut self, name: impl Into<String>, mtime: f64) -> Option<f64> {
        self.entries.insert(name.into(), mtime)
    }

    /// Inserts a file record.
    pub fn insert_record(&mut self, record: FileRecord) -> Option<f64> {
        self.entries.insert(record.name, record.mtime)
    }

    /// Removes a file from the map.
    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.entries.remove(name)
    }

    /// Returns the mtime recorded for `name`, or `None` if absent.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(name).copied()
    }

    /// Returns true if the map has an entry for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no files.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(filename, mtime)` pairs in filename order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(name, mtime)| (name.as_str(), *mtime))
    }

    /// Iterates over the filenames in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the map as a list of file records.
    pub fn records(&self) -> Vec<FileRecord> {
        self.iter()
            .map(|(name, mtime)| FileRecord::new(name, mtime))
            .collect()
    }

    /// Encodes to JSON.
    pub fn to_json(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn from_json(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl FromIterator<FileRecord> for VersionMap {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut map = Self::new();
        for record in iter {
            map.insert_record(record);
        }
        map
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for VersionMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, mtime)| (name.into(), mtime))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, f64>> for VersionMap {
    fn from(entries: BTreeMap<String, f64>) -> Self {
        Self { entries }
    }
}

impl IntoIterator for VersionMap {
    type Item = (String, f64);
    type IntoIter = btree_map::IntoIter<String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_entry_per_filename() {
        let mut map = VersionMap::new();
        assert_eq!(map.insert("a.txt", 100.0), None);
        assert_eq!(map.insert("a.txt", 150.5), Some(100.0));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a.txt"), Some(150.5));
    }

    #[test]
    fn absent_key_is_none() {
        let map: VersionMap = [("a.txt", 1.0)].into_iter().collect();
        assert!(map.contains("a.txt"));
        assert!(!map.contains("b.txt"));
        assert_eq!(map.get("b.txt"), None);
    }

    #[test]
    fn iteration_is_sorted() {
        let map: VersionMap = [("c", 3.0), ("a", 1.0), ("b", 2.0)].into_iter().collect();
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn json_is_a_flat_object() {
        let map: VersionMap = [("a.txt", 1700000000.25)].into_iter().collect();
        let json = String::from_utf8(map.to_json().unwrap()).unwrap();
        assert_eq!(json, r#"{"a.txt":1700000000.25}"#);

        let decoded = VersionMap::from_json(br#"{"x": 5, "y": 6.5}"#).unwrap();
        assert_eq!(decoded.get("x"), Some(5.0));
        assert_eq!(decoded.get("y"), Some(6.5));
    }

    #[test]
    fn records_roundtrip_through_collect() {
        let records = vec![FileRecord::new("b", 2.0), FileRecord::new("a", 1.0)];
        let map: VersionMap = records.into_iter().collect();
        assert_eq!(
            map.records(),
            vec![FileRecord::new("a", 1.0), FileRecord::new("b", 2.0)]
        );
    }
}

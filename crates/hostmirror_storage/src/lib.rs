//! # hostmirror storage
//!
//! Local storage for mirrored files.
//!
//! This crate provides the scanner that turns a directory into a
//! [`VersionMap`](hostmirror_protocol::VersionMap) and the [`LocalStore`]
//! abstraction the client applies sync actions through.
//!
//! ## Design Principles
//!
//! - Scans are flat: only regular files directly inside a directory count
//! - Per-entry failures while scanning are treated as absence
//! - Writes are atomic: a file is either fully replaced or left untouched
//! - The mtime is stamped as a separate step after a successful write
//!
//! ## Available Stores
//!
//! - [`DirStore`] - A directory on the local filesystem
//! - [`InMemoryStore`] - For testing
//!
//! ## Example
//!
//! ```rust
//! use hostmirror_storage::{InMemoryStore, LocalStore};
//!
//! let store = InMemoryStore::new();
//! store.write_file("a.txt", b"hello").unwrap();
//! store.set_mtime("a.txt", 100.0).unwrap();
//! assert_eq!(store.scan().unwrap().get("a.txt"), Some(100.0));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dir;
mod error;
mod memory;
mod scan;
mod store;

pub use dir::DirStore;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use scan::{scan_dir, secs_to_system_time, system_time_to_secs, TEMP_PREFIX};
pub use store::LocalStore;

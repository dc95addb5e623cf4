//! # hostmirror protocol
//!
//! Data model and reconciliation algorithm shared by the hostmirror server
//! and client.
//!
//! This crate provides:
//! - [`VersionMap`] and [`FileRecord`] for tracking file freshness per host
//! - [`HostId`] for scoping a version map to one mirrored client
//! - [`SyncAction`] and [`reconcile`] for turning two version maps into work
//! - JSON wire messages used by the HTTP transport
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Freshness model
//!
//! Modification time is the only signal of change. There is no hash or size
//! comparison: a file rewritten with identical content but a newer mtime is
//! downloaded again, and a file edited without touching its mtime is never
//! detected.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod error;
mod host;
mod messages;
mod reconcile;
mod version_map;

pub use action::SyncAction;
pub use error::{ProtocolError, ProtocolResult};
pub use host::{validate_filename, HostId};
pub use messages::{CheckUpdatesRequest, ErrorBody};
pub use reconcile::{reconcile, updates_for};
pub use version_map::{FileRecord, VersionMap};

//! # hostmirror client
//!
//! The reconciling side of hostmirror.
//!
//! This crate provides:
//! - [`SyncEngine`], which periodically converges a local directory on the
//!   server's view of this host
//! - [`MirrorTransport`], the seam between the engine and the server, with
//!   an HTTP implementation and a mock for tests
//!
//! ## Pass model
//!
//! Every pass is independent:
//! 1. Fetch the server's full version map for this host
//! 2. Scan the local store
//! 3. Reconcile: delete what the server no longer has, download what is new
//!    or strictly newer on the server
//! 4. Apply each action, stamping downloads with the server's mtime
//!
//! Because downloads carry the server's mtime, a pass over an unchanged
//! server is a no-op. Failed actions are simply replanned on the next pass.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod http;
mod transport;

pub use config::SyncConfig;
pub use engine::{ActionFailure, PassReport, SyncEngine, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::HttpTransport;
pub use transport::{MirrorTransport, MockTransport};

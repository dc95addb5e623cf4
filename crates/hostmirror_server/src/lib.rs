//! # hostmirror server
//!
//! The authoritative side of hostmirror.
//!
//! This crate provides:
//! - [`WatchTable`], the per-host table of filenames and mtimes
//! - [`TableWatcher`], which rebuilds the table on filesystem notifications
//! - HTTP endpoints for version queries and file downloads
//!
//! # Architecture
//!
//! The storage root holds one subdirectory per host; the subdirectory name is
//! the host's [`HostId`](hostmirror_protocol::HostId). Any change anywhere
//! under the root triggers a full rebuild of the table. Requests are answered
//! from the table's current snapshot and never rescan on their own.
//!
//! ```text
//! root/
//! ├── web-01/
//! │   ├── app.conf
//! │   └── motd
//! └── web-02/
//!     └── app.conf
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod http;
mod server;
mod table;
mod watcher;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use http::router;
pub use server::MirrorServer;
pub use table::{RebuildStats, WatchTable};
pub use watcher::TableWatcher;

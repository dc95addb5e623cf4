//! Configuration for the sync client.

use hostmirror_protocol::HostId;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Identity this client's files are tracked under on the server.
    pub host: HostId,
    /// Server URL.
    pub server_url: String,
    /// Local directory mirrored from the server.
    pub storage_dir: PathBuf,
    /// Pause between the end of one pass and the start of the next.
    pub interval: Duration,
    /// Request timeout.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(host: HostId, server_url: impl Into<String>) -> Self {
        Self {
            host,
            server_url: server_url.into(),
            storage_dir: PathBuf::from("clientfiles"),
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the local storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Sets the interval between passes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

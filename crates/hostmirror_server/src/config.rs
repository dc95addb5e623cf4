//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the mirror server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Storage root; each immediate subdirectory holds one host's files.
    pub root: PathBuf,
    /// Quiet period used to coalesce bursts of change notifications.
    pub debounce: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr, root: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr,
            root: root.into(),
            debounce: Duration::from_millis(250),
        }
    }

    /// Sets the storage root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the notification debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(
            SocketAddr::from(([0, 0, 0, 0], 8000)),
            "../testserverpath",
        )
    }
}

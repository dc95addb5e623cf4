//! Transport layer abstraction for sync operations.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use bytes::Bytes;
use hostmirror_protocol::{updates_for, HostId, VersionMap};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A mirror transport handles communication with the mirror server.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-process, mock for testing).
#[async_trait]
pub trait MirrorTransport: Send + Sync {
    /// Fetches the server's full version map for a host.
    ///
    /// Returns [`SyncError::NotFound`] if the server has no entry for the host.
    async fn fetch_versions(&self, host: &HostId) -> SyncResult<VersionMap>;

    /// Reports the client's map and fetches only the entries it lacks or
    /// holds older copies of.
    async fn check_updates(&self, host: &HostId, files: &VersionMap) -> SyncResult<VersionMap>;

    /// Fetches the current content of one of a host's files.
    ///
    /// Returns [`SyncError::NotFound`] if the file no longer exists.
    async fn fetch_file(&self, host: &HostId, filename: &str) -> SyncResult<Bytes>;
}

/// A mock transport for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    disconnected: AtomicBool,
    versions: Mutex<HashMap<HostId, VersionMap>>,
    files: Mutex<HashMap<(HostId, String), Bytes>>,
    failing_files: Mutex<HashSet<String>>,
    version_requests: AtomicUsize,
    file_requests: AtomicUsize,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the version map served for a host.
    pub fn set_versions(&self, host: &HostId, versions: VersionMap) {
        self.versions.lock().insert(host.clone(), versions);
    }

    /// Sets the content served for a host's file.
    pub fn set_file(&self, host: &HostId, filename: &str, data: impl Into<Bytes>) {
        self.files
            .lock()
            .insert((host.clone(), filename.to_string()), data.into());
    }

    /// Makes every fetch of `filename` fail with a transport error.
    pub fn fail_file(&self, filename: &str) {
        self.failing_files.lock().insert(filename.to_string());
    }

    /// Simulates the server being unreachable.
    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::SeqCst);
    }

    /// Returns how many version queries were made.
    pub fn version_requests(&self) -> usize {
        self.version_requests.load(Ordering::SeqCst)
    }

    /// Returns how many file fetches were made.
    pub fn file_requests(&self) -> usize {
        self.file_requests.load(Ordering::SeqCst)
    }

    fn check_connected(&self) -> SyncResult<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            Err(SyncError::transport_retryable("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MirrorTransport for MockTransport {
    async fn fetch_versions(&self, host: &HostId) -> SyncResult<VersionMap> {
        self.version_requests.fetch_add(1, Ordering::SeqCst);
        self.check_connected()?;
        self.versions
            .lock()
            .get(host)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("unknown host: {host}")))
    }

    async fn check_updates(&self, host: &HostId, files: &VersionMap) -> SyncResult<VersionMap> {
        let remote = self.fetch_versions(host).await?;
        Ok(updates_for(&remote, files))
    }

    async fn fetch_file(&self, host: &HostId, filename: &str) -> SyncResult<Bytes> {
        self.file_requests.fetch_add(1, Ordering::SeqCst);
        self.check_connected()?;
        if self.failing_files.lock().contains(filename) {
            return Err(SyncError::transport_retryable(format!(
                "connection reset fetching {filename}"
            )));
        }
        self.files
            .lock()
            .get(&(host.clone(), filename.to_string()))
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("{host}/{filename}")))
    }
}

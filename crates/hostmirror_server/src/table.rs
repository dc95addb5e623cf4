//! The server's authoritative per-host version table.

use crate::error::{ServerError, ServerResult};
use hostmirror_protocol::{HostId, VersionMap};
use hostmirror_storage::scan_dir;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one [`WatchTable::rebuild_all`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildStats {
    /// Hosts present in the new table.
    pub hosts: usize,
    /// Files across all hosts in the new table.
    pub files: usize,
    /// Hosts whose scan failed and kept their previous snapshot.
    pub failed: usize,
}

/// Process-wide mapping from host to its current version map.
///
/// The table maintains:
/// - One immutable [`VersionMap`] snapshot per host, shared via `Arc`
/// - A generation counter bumped on every completed rebuild
///
/// # Consistency
///
/// A rebuild computes the complete new table before taking the write lock
/// and swaps it in one step. Readers clone an `Arc` under the read lock, so
/// they observe either the complete pre-rebuild map or the complete
/// post-rebuild map for a host, never a mixture. Rebuilds are serialized.
pub struct WatchTable {
    root: PathBuf,
    hosts: RwLock<HashMap<HostId, Arc<VersionMap>>>,
    rebuild_lock: Mutex<()>,
    generation: AtomicU64,
}

impl WatchTable {
    /// Creates an empty table over a storage root.
    ///
    /// Nothing is scanned until [`rebuild_all`](Self::rebuild_all) runs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            hosts: RwLock::new(HashMap::new()),
            rebuild_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Creates a table after checking that the root is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if the root does not exist.
    pub fn open(root: impl Into<PathBuf>) -> ServerResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ServerError::Config(root));
        }
        Ok(Self::new(root))
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the current snapshot for a host.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::UnknownHost`] if the host has no entry. A known
    /// host with no files yields an empty map instead.
    pub fn get(&self, host: &HostId) -> ServerResult<Arc<VersionMap>> {
        self.lookup(host)
            .ok_or_else(|| ServerError::UnknownHost(host.clone()))
    }

    /// Returns the current snapshot for a host, if any.
    pub fn lookup(&self, host: &HostId) -> Option<Arc<VersionMap>> {
        self.hosts.read().get(host).cloned()
    }

    /// Returns the known hosts in sorted order.
    pub fn hosts(&self) -> Vec<HostId> {
        let mut hosts: Vec<_> = self.hosts.read().keys().cloned().collect();
        hosts.sort();
        hosts
    }

    /// Returns the number of known hosts.
    pub fn len(&self) -> usize {
        self.hosts.read().len()
    }

    /// Returns true if no host is known.
    pub fn is_empty(&self) -> bool {
        self.hosts.read().is_empty()
    }

    /// Returns how many rebuilds have completed.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Rescans every host directory under the root and swaps in the result.
    ///
    /// Each immediate subdirectory of the root is a host; its name is the
    /// [`HostId`]. Hosts whose directory disappeared are dropped. A host
    /// whose scan fails keeps its previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the root itself cannot be listed. The previous
    /// table stays in place.
    pub fn rebuild_all(&self) -> ServerResult<RebuildStats> {
        let _guard = self.rebuild_lock.lock();

        let entries = fs::read_dir(&self.root)?;
        let previous = self.hosts.read().clone();

        let mut next = HashMap::new();
        let mut stats = RebuildStats::default();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable root entry");
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let host = match entry.file_name().into_string().map(HostId::new) {
                Ok(Ok(host)) => host,
                _ => {
                    debug!(path = %path.display(), "skipping directory that is not a valid host id");
                    continue;
                }
            };

            match scan_dir(&path) {
                Ok(map) => {
                    next.insert(host, Arc::new(map));
                }
                Err(e) => {
                    warn!(host = %host, error = %e, "host scan failed, keeping previous snapshot");
                    stats.failed += 1;
                    if let Some(snapshot) = previous.get(&host) {
                        next.insert(host, Arc::clone(snapshot));
                    }
                }
            }
        }

        stats.hosts = next.len();
        stats.files = next.values().map(|map| map.len()).sum();

        *self.hosts.write() = next;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            generation,
            hosts = stats.hosts,
            files = stats.files,
            failed = stats.failed,
            "file versions updated"
        );
        Ok(stats)
    }
}

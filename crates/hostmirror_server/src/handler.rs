//! Request handlers for mirror endpoints.

use crate::error::{ServerError, ServerResult};
use crate::table::WatchTable;
use hostmirror_protocol::{updates_for, validate_filename, CheckUpdatesRequest, HostId, VersionMap};
use hostmirror_storage::{DirStore, LocalStore};
use std::sync::Arc;
use tracing::debug;

/// Handler for mirror requests.
///
/// All lookups go through the shared [`WatchTable`]; file content is read
/// straight from the host's directory under the storage root.
#[derive(Clone)]
pub struct RequestHandler {
    table: Arc<WatchTable>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(table: Arc<WatchTable>) -> Self {
        Self { table }
    }

    /// Returns the table this handler reads from.
    pub fn table(&self) -> &Arc<WatchTable> {
        &self.table
    }

    /// Returns the full version map for a host.
    pub fn handle_versions(&self, host: &HostId) -> ServerResult<VersionMap> {
        let map = self.table.get(host)?;
        Ok(map.as_ref().clone())
    }

    /// Returns the entries the reporting client lacks or holds older.
    pub fn handle_check_updates(&self, request: &CheckUpdatesRequest) -> ServerResult<VersionMap> {
        let remote = self.table.get(&request.hostname).inspect_err(|_| {
            debug!(host = %request.hostname, "check_updates for unknown host");
        })?;
        Ok(updates_for(&remote, &request.files))
    }

    /// Reads the stored content of one of a host's files.
    ///
    /// The file may have vanished since the host's map was built; that is
    /// reported as [`ServerError::FileNotFound`].
    pub fn handle_download(&self, host: &HostId, filename: &str) -> ServerResult<Vec<u8>> {
        validate_filename(filename)?;
        if self.table.lookup(host).is_none() {
            return Err(ServerError::UnknownHost(host.clone()));
        }

        let not_found = || ServerError::FileNotFound {
            host: host.clone(),
            filename: filename.to_string(),
        };

        let host_dir = self.table.root().join(host.as_str());
        let store = DirStore::open(&host_dir).map_err(|_| not_found())?;
        store.read_file(filename).map_err(|e| {
            if e.is_not_found() {
                not_found()
            } else {
                ServerError::Storage(e)
            }
        })
    }
}

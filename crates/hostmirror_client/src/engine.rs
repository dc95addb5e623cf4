//! Sync loop state machine.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::MirrorTransport;
use hostmirror_protocol::{reconcile, SyncAction};
use hostmirror_storage::{LocalStore, StorageResult};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The current state of the sync loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Waiting for the next pass.
    Idle,
    /// A pass is in progress.
    Reconciling,
}

impl SyncState {
    /// Returns true while a pass is running.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Reconciling)
    }
}

/// Statistics accumulated across passes.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Passes that reached the apply phase.
    pub passes_completed: u64,
    /// Passes that ended early (remote query or local scan failed).
    pub passes_failed: u64,
    /// Files downloaded.
    pub downloads: u64,
    /// Files deleted.
    pub deletes: u64,
    /// Actions that failed.
    pub failures: u64,
    /// Most recent error message; clean passes leave it unchanged.
    pub last_error: Option<String>,
    /// When the last pass finished.
    pub last_pass_time: Option<Instant>,
}

/// An action that could not be applied.
#[derive(Debug, Clone)]
pub struct ActionFailure {
    /// The action.
    pub action: SyncAction,
    /// Why it failed.
    pub error: String,
}

/// Outcome of a single pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Actions produced by reconciliation.
    pub planned: Vec<SyncAction>,
    /// Files successfully downloaded.
    pub downloaded: usize,
    /// Files successfully deleted.
    pub deleted: usize,
    /// Actions that failed.
    pub failures: Vec<ActionFailure>,
    /// Wall time of the pass.
    pub duration: Duration,
}

impl PassReport {
    /// Returns true if the pass planned any work.
    pub fn has_updates(&self) -> bool {
        !self.planned.is_empty()
    }

    /// Returns true if every planned action was applied.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-word outcome used in logs.
    pub fn summary(&self) -> &'static str {
        if self.has_updates() {
            "Updates"
        } else {
            "No Updates"
        }
    }
}

/// Drives reconciliation of a local store against the server.
///
/// Each pass fetches the server's full map for this host, scans the store,
/// reconciles the two and applies the resulting actions one at a time.
/// Action failures are recorded and retried on the next pass; they never
/// abort the pass or the loop.
pub struct SyncEngine<T: MirrorTransport, S: LocalStore> {
    config: SyncConfig,
    transport: Arc<T>,
    store: Arc<S>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
}

impl<T: MirrorTransport, S: LocalStore + 'static> SyncEngine<T, S> {
    /// Creates a new sync engine.
    pub fn new(config: SyncConfig, transport: T, store: S) -> Self {
        Self::with_shared(config, Arc::new(transport), Arc::new(store))
    }

    /// Creates a sync engine over shared collaborators.
    pub fn with_shared(config: SyncConfig, transport: Arc<T>, store: Arc<S>) -> Self {
        Self {
            config,
            transport,
            store,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns the local store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Runs a store operation on the blocking pool.
    async fn with_store<R, F>(&self, op: F) -> SyncResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&S) -> StorageResult<R> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| SyncError::Internal(e.to_string()))?;
        Ok(result?)
    }

    /// Runs a single pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote map cannot be fetched or the local
    /// store cannot be scanned. Failures of individual actions are reported
    /// in the [`PassReport`] instead.
    pub async fn run_pass(&self) -> SyncResult<PassReport> {
        self.set_state(SyncState::Reconciling);
        let result = self.reconcile_and_apply().await;
        self.set_state(SyncState::Idle);

        let mut stats = self.stats.write();
        stats.last_pass_time = Some(Instant::now());
        match &result {
            Ok(report) => {
                stats.passes_completed += 1;
                stats.downloads += report.downloaded as u64;
                stats.deletes += report.deleted as u64;
                stats.failures += report.failures.len() as u64;
                if let Some(failure) = report.failures.last() {
                    stats.last_error = Some(failure.error.clone());
                }
            }
            Err(e) => {
                stats.passes_failed += 1;
                stats.last_error = Some(e.to_string());
            }
        }

        result
    }

    async fn reconcile_and_apply(&self) -> SyncResult<PassReport> {
        let start = Instant::now();
        let host = &self.config.host;

        let remote = self.transport.fetch_versions(host).await?;
        match self.with_store(|store| store.remove_stale_temp_files()).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "removed stale temp files"),
            Err(e) => warn!(error = %e, "could not remove stale temp files"),
        }
        let local = self.with_store(|store| store.scan()).await?;
        let planned = reconcile(&local, &remote);
        debug!(
            local = local.len(),
            remote = remote.len(),
            actions = planned.len(),
            "reconciled"
        );

        let mut report = PassReport::default();
        for action in &planned {
            match self.apply(action).await {
                Ok(()) => {
                    debug!(%action, "applied");
                    if action.is_download() {
                        report.downloaded += 1;
                    } else {
                        report.deleted += 1;
                    }
                }
                Err(e) => {
                    warn!(%action, error = %e, "action failed");
                    report.failures.push(ActionFailure {
                        action: action.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.planned = planned;
        report.duration = start.elapsed();
        Ok(report)
    }

    async fn apply(&self, action: &SyncAction) -> SyncResult<()> {
        match action {
            SyncAction::Download {
                filename,
                expected_mtime,
            } => {
                let data = self
                    .transport
                    .fetch_file(&self.config.host, filename)
                    .await?;
                let name = filename.clone();
                let mtime = *expected_mtime;
                self.with_store(move |store| {
                    store.write_file(&name, &data)?;
                    store.set_mtime(&name, mtime)
                })
                .await?;
            }
            SyncAction::Delete { filename } => {
                let name = filename.clone();
                let existed = self
                    .with_store(move |store| store.delete_file(&name))
                    .await?;
                if !existed {
                    debug!(filename = %filename, "already absent");
                }
            }
        }
        Ok(())
    }

    /// Runs passes until `cancel` fires.
    ///
    /// The interval is measured from the end of one pass to the start of the
    /// next. Cancellation is observed between passes and during the wait; a
    /// pass in flight always runs to completion.
    pub async fn run(&self, cancel: CancellationToken) -> SyncStats {
        info!(
            host = %self.config.host,
            server = %self.config.server_url,
            interval_ms = self.config.interval.as_millis() as u64,
            "sync loop started"
        );

        while !cancel.is_cancelled() {
            match self.run_pass().await {
                Ok(report) => {
                    info!(
                        planned = report.planned.len(),
                        downloaded = report.downloaded,
                        deleted = report.deleted,
                        failed = report.failures.len(),
                        elapsed_ms = report.duration.as_millis() as u64,
                        "{}",
                        report.summary()
                    );
                }
                Err(e) => {
                    warn!(error = %e, "pass failed");
                }
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!("sync loop stopped");
        self.stats()
    }

    /// Runs one pass unless `cancel` has already fired.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cancelled`] if cancellation was requested before
    /// the pass started, otherwise see [`SyncEngine::run_pass`].
    pub async fn run_once(&self, cancel: &CancellationToken) -> SyncResult<PassReport> {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        self.run_pass().await
    }
}

//! Filesystem notifications that keep a [`WatchTable`] current.

use crate::error::ServerResult;
use crate::table::WatchTable;
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Returns true for notifications that can change a host's file set.
fn triggers_rebuild(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Handles one debounced batch of notifications.
fn on_events(table: &WatchTable, result: DebounceEventResult) {
    match result {
        Ok(events) => {
            let relevant: Vec<_> = events
                .iter()
                .filter(|event| triggers_rebuild(&event.kind))
                .collect();
            if relevant.is_empty() {
                return;
            }

            for event in relevant {
                debug!(kind = ?event.kind, paths = ?event.paths, "change notification");
            }

            if let Err(e) = table.rebuild_all() {
                warn!(error = %e, "rebuild failed, keeping previous table");
            }
        }
        Err(errors) => {
            for error in errors {
                warn!(error = %error, "watch error");
            }
        }
    }
}

/// Watches a table's storage root and rebuilds the table on change.
///
/// Any create, modify, remove or rename anywhere under the root triggers a
/// full [`WatchTable::rebuild_all`]. Bursts of notifications inside the
/// debounce window are coalesced into one rebuild.
pub struct TableWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl TableWatcher {
    /// Starts watching `table`'s root recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be created or the
    /// root cannot be watched.
    pub fn start(table: Arc<WatchTable>, debounce: Duration) -> ServerResult<Self> {
        let root = table.root().to_path_buf();
        let handler_table = Arc::clone(&table);

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            on_events(&handler_table, result);
        })?;
        debouncer.watch(&root, RecursiveMode::Recursive)?;

        info!(root = %root.display(), debounce_ms = debounce.as_millis() as u64, "watching for changes");
        Ok(Self { debouncer })
    }

    /// Stops accepting notifications and waits for an in-flight rebuild.
    pub fn stop(self) {
        self.debouncer.stop();
        info!("watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostmirror_protocol::HostId;
    use hostmirror_storage::scan_dir;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind, RenameMode};
    use std::fs;
    use std::time::Instant;
    use tempfile::tempdir;

    #[test]
    fn rebuild_trigger_policy() {
        assert!(triggers_rebuild(&EventKind::Create(CreateKind::File)));
        assert!(triggers_rebuild(&EventKind::Modify(ModifyKind::Any)));
        assert!(triggers_rebuild(&EventKind::Modify(ModifyKind::Name(
            RenameMode::Both
        ))));
        assert!(triggers_rebuild(&EventKind::Remove(RemoveKind::File)));
        assert!(!triggers_rebuild(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn errors_do_not_touch_table() {
        let dir = tempdir().unwrap();
        let table = WatchTable::new(dir.path());
        on_events(&table, Err(vec![notify::Error::generic("boom")]));
        assert_eq!(table.generation(), 0);
    }

    /// Polls `cond` until it holds or ten seconds pass.
    fn wait_for(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(25));
        }
        cond()
    }

    fn alpha() -> HostId {
        HostId::new("alpha").unwrap()
    }

    #[test]
    fn watcher_picks_up_new_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();

        let table = Arc::new(WatchTable::new(dir.path()));
        table.rebuild_all().unwrap();
        let watcher = TableWatcher::start(Arc::clone(&table), Duration::from_millis(50)).unwrap();

        fs::write(dir.path().join("alpha").join("new.txt"), b"hello").unwrap();

        let seen = wait_for(|| table.get(&alpha()).unwrap().contains("new.txt"));
        watcher.stop();
        assert!(seen);
    }

    #[test]
    fn watcher_tracks_remove_and_rename() {
        let dir = tempdir().unwrap();
        let host_dir = dir.path().join("alpha");
        fs::create_dir(&host_dir).unwrap();
        fs::write(host_dir.join("gone.txt"), b"old").unwrap();
        fs::write(host_dir.join("before.txt"), b"moved").unwrap();
        fs::write(host_dir.join("stays.txt"), b"kept").unwrap();

        let table = Arc::new(WatchTable::new(dir.path()));
        table.rebuild_all().unwrap();
        assert_eq!(table.get(&alpha()).unwrap().len(), 3);
        let watcher = TableWatcher::start(Arc::clone(&table), Duration::from_millis(50)).unwrap();

        fs::remove_file(host_dir.join("gone.txt")).unwrap();
        fs::rename(host_dir.join("before.txt"), host_dir.join("after.txt")).unwrap();

        let settled = wait_for(|| {
            let current = table.get(&alpha()).unwrap();
            !current.contains("gone.txt")
                && !current.contains("before.txt")
                && current.contains("after.txt")
        });
        watcher.stop();
        assert!(settled);

        let expected = scan_dir(&host_dir).unwrap();
        assert_eq!(*table.get(&alpha()).unwrap(), expected);
        assert_eq!(expected.len(), 2);
    }

    #[test]
    fn watcher_rebuilds_on_nested_change() {
        let dir = tempdir().unwrap();
        let host_dir = dir.path().join("alpha");
        let deep = host_dir.join("sub").join("deep");
        fs::create_dir_all(&deep).unwrap();
        fs::write(host_dir.join("top.txt"), b"top").unwrap();

        let table = Arc::new(WatchTable::new(dir.path()));
        table.rebuild_all().unwrap();
        let before = table.generation();
        let watcher = TableWatcher::start(Arc::clone(&table), Duration::from_millis(50)).unwrap();

        fs::write(deep.join("nested.txt"), b"below the host level").unwrap();

        let advanced = wait_for(|| table.generation() > before);
        watcher.stop();
        assert!(advanced);

        // Only the host's own entries are mirrored.
        let current = table.get(&alpha()).unwrap();
        assert_eq!(*current, scan_dir(&host_dir).unwrap());
        assert!(!current.contains("nested.txt"));
    }

    #[test]
    fn watcher_discovers_new_host() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();

        let table = Arc::new(WatchTable::new(dir.path()));
        table.rebuild_all().unwrap();
        let beta = HostId::new("beta").unwrap();
        assert!(table.lookup(&beta).is_none());
        let watcher = TableWatcher::start(Arc::clone(&table), Duration::from_millis(50)).unwrap();

        let beta_dir = dir.path().join("beta");
        fs::create_dir(&beta_dir).unwrap();
        fs::write(beta_dir.join("motd"), b"welcome").unwrap();

        let found = wait_for(|| {
            table
                .lookup(&beta)
                .is_some_and(|files| files.contains("motd"))
        });
        watcher.stop();
        assert!(found);
        assert_eq!(table.hosts(), vec![alpha(), beta]);
    }
}

//! The reconciliation algorithm.
//!
//! Given the client's local [`VersionMap`] and the server's remote one for
//! the same host, [`reconcile`] returns the actions that converge the local
//! copy toward the remote:
//!
//! | local | remote | action |
//! |-------|--------|--------|
//! | present | absent | `Delete` |
//! | `l` | `r > l` | `Download(r)` |
//! | `l` | `r <= l` | none (ties favor local) |
//! | absent | `r` | `Download(r)` |
//!
//! Comparison is strict with no tolerance for clock skew between the two
//! filesystems.

use crate::action::SyncAction;
use crate::version_map::VersionMap;

/// Diffs `local` against `remote` and returns the actions to apply locally.
///
/// Every filename in the union of both maps yields at most one action.
/// Deletions come first, then downloads, each group in filename order, so the
/// result is identical across calls for the same inputs.
pub fn reconcile(local: &VersionMap, remote: &VersionMap) -> Vec<SyncAction> {
    let mut deletes = Vec::new();
    let mut downloads = Vec::new();

    for (name, local_mtime) in local.iter() {
        match remote.get(name) {
            None => deletes.push(SyncAction::delete(name)),
            Some(remote_mtime) if remote_mtime > local_mtime => {
                downloads.push(SyncAction::download(name, remote_mtime));
            }
            Some(_) => {}
        }
    }

    for (name, remote_mtime) in remote.iter() {
        if !local.contains(name) {
            downloads.push(SyncAction::download(name, remote_mtime));
        }
    }

    // Both loops walk sorted keys; merge the two download runs back into order.
    downloads.sort_by(|a, b| a.filename().cmp(b.filename()));

    deletes.extend(downloads);
    deletes
}

/// Returns the entries of `remote` that a client reporting `reported` lacks
/// or holds an older copy of.
///
/// This is the server-side half of reconciliation: it never yields deletions,
/// so a client that needs to prune must query the full map instead.
pub fn updates_for(remote: &VersionMap, reported: &VersionMap) -> VersionMap {
    remote
        .iter()
        .filter(|(name, mtime)| match reported.get(name) {
            None => true,
            Some(local_mtime) => *mtime > local_mtime,
        })
        .collect()
}

//! Client command implementation.

use anyhow::{anyhow, Context};
use hostmirror_client::{HttpTransport, SyncConfig, SyncEngine};
use hostmirror_protocol::HostId;
use hostmirror_storage::DirStore;
use std::path::PathBuf;
use std::time::Duration;
use sysinfo::System;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Options for the client command.
pub struct ClientOptions {
    /// Server URL.
    pub server: String,
    /// Local directory to keep in sync.
    pub dir: PathBuf,
    /// Explicit host id.
    pub hostname: Option<String>,
    /// Seconds between passes.
    pub interval: u64,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Run a single pass.
    pub once: bool,
}

/// Picks the host id: the explicit one, else the machine hostname.
fn resolve_host(explicit: Option<String>) -> anyhow::Result<HostId> {
    let name = match explicit {
        Some(name) => name,
        None => System::host_name()
            .ok_or_else(|| anyhow!("cannot determine hostname; pass --hostname"))?,
    };
    HostId::new(name).context("invalid host id")
}

/// Runs the client command.
pub fn run(options: ClientOptions) -> anyhow::Result<()> {
    let host = resolve_host(options.hostname)?;
    let config = SyncConfig::new(host, options.server)
        .with_storage_dir(options.dir)
        .with_interval(Duration::from_secs(options.interval))
        .with_timeout(Duration::from_secs(options.timeout));

    let store = DirStore::open_with_create_dirs(&config.storage_dir)
        .with_context(|| format!("cannot use {}", config.storage_dir.display()))?;
    let transport = HttpTransport::from_config(&config)?;
    let engine = SyncEngine::new(config, transport, store);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async {
        if options.once {
            let report = engine.run_pass().await?;
            println!(
                "{}: {} downloaded, {} deleted, {} failed",
                report.summary(),
                report.downloaded,
                report.deleted,
                report.failures.len()
            );
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let signal = cancel.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received Ctrl-C, finishing current pass");
            signal.cancel();
        });

        let stats = engine.run(cancel).await;
        info!(
            passes = stats.passes_completed,
            failed_passes = stats.passes_failed,
            downloads = stats.downloads,
            deletes = stats.deletes,
            "client stopped"
        );
        Ok::<_, anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_hostname_wins() {
        let host = resolve_host(Some("web-01".into())).unwrap();
        assert_eq!(host.as_str(), "web-01");
    }

    #[test]
    fn invalid_hostname_rejected() {
        assert!(resolve_host(Some("../etc".into())).is_err());
        assert!(resolve_host(Some(String::new())).is_err());
    }
}

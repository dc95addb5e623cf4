//! Serve command implementation.

use anyhow::Context;
use hostmirror_server::{MirrorServer, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Runs the serve command until Ctrl-C.
pub fn run(root: PathBuf, bind: SocketAddr, debounce_ms: u64) -> anyhow::Result<()> {
    let config = ServerConfig::new(bind, root).with_debounce(Duration::from_millis(debounce_ms));
    let server = MirrorServer::new(config)
        .context("cannot serve: storage root must be an existing directory")?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async {
        server
            .serve(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("received Ctrl-C");
            })
            .await
    })?;

    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = run(
            dir.path().join("absent"),
            "127.0.0.1:0".parse().unwrap(),
            250,
        )
        .unwrap_err();
        assert!(err.to_string().contains("storage root"));
    }
}

//! Main mirror server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::RequestHandler;
use crate::http::router;
use crate::table::WatchTable;
use crate::watcher::TableWatcher;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The mirror server.
///
/// Owns the [`WatchTable`] and wires it to the filesystem watcher and the
/// HTTP routes.
///
/// # Lifecycle
///
/// 1. The table is populated by an eager rebuild
/// 2. A [`TableWatcher`] keeps it current
/// 3. HTTP requests are answered from the table until shutdown resolves
/// 4. The listener drains, then the watcher is stopped, which waits for any
///    in-flight rebuild
///
/// # Example
///
/// ```no_run
/// use hostmirror_server::{MirrorServer, ServerConfig};
///
/// # async fn run() -> hostmirror_server::ServerResult<()> {
/// let server = MirrorServer::new(ServerConfig::default())?;
/// server.serve(async { let _ = tokio::signal::ctrl_c().await; }).await
/// # }
/// ```
pub struct MirrorServer {
    config: ServerConfig,
    table: Arc<WatchTable>,
    handler: RequestHandler,
}

impl MirrorServer {
    /// Creates a server over the configured storage root.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if the root is not a directory.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let table = Arc::new(WatchTable::open(&config.root)?);
        Ok(Self::with_table(config, table))
    }

    /// Creates a server with an existing table.
    pub fn with_table(config: ServerConfig, table: Arc<WatchTable>) -> Self {
        let handler = RequestHandler::new(Arc::clone(&table));
        Self {
            config,
            table,
            handler,
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the shared version table.
    pub fn table(&self) -> &Arc<WatchTable> {
        &self.table
    }

    /// Returns the request handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Returns the HTTP router for this server.
    pub fn router(&self) -> Router {
        router(self.handler.clone())
    }

    /// Populates the table and starts the watcher that keeps it current.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be listed or watched.
    pub fn start_watching(&self) -> ServerResult<TableWatcher> {
        self.table.rebuild_all()?;
        TableWatcher::start(Arc::clone(&self.table), self.config.debounce)
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if binding, the initial rebuild, or the watcher fails.
    pub async fn serve<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial rebuild or the watcher fails.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let watcher = self.start_watching()?;
        info!(addr = %listener.local_addr()?, root = %self.table.root().display(), "mirror server listening");

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;

        info!("shutting down, stopping watcher");
        tokio::task::spawn_blocking(move || watcher.stop())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        served.map_err(ServerError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostmirror_protocol::HostId;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let config = ServerConfig::default().with_root(dir.path().join("missing"));
        assert!(matches!(
            MirrorServer::new(config),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn start_watching_populates_table() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::write(dir.path().join("alpha").join("a.txt"), b"x").unwrap();

        let server = MirrorServer::new(ServerConfig::default().with_root(dir.path())).unwrap();
        assert!(server.table().is_empty());

        let watcher = server.start_watching().unwrap();
        let host = HostId::new("alpha").unwrap();
        assert!(server.table().get(&host).unwrap().contains("a.txt"));
        watcher.stop();
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let dir = tempdir().unwrap();
        let server = MirrorServer::new(ServerConfig::default().with_root(dir.path())).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        server.serve_on(listener, async {}).await.unwrap();
    }
}

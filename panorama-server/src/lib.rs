//! panorama-server - HTTP server for the panorama host
//!
//! Serves the host shell's `index.html` for every route the host router
//! owns, each plugin's `style.css` and module from `/plugins/{id}/`, and a
//! small JSON API the shell reads at boot. Plugins with a configured backend
//! get a supervised process and a proxy at `/api/plugin/{id}/`.

pub mod backend;
mod error;
pub mod http;
mod state;

use std::sync::Arc;

use panorama_core::{PanoramaConfig, ServerConfig};
use tokio::net::TcpListener;

use crate::backend::{BackendSupervisor, SupervisorSettings};

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;

/// The panorama HTTP server
pub struct PanoramaServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl PanoramaServer {
    /// Create a server for the given host configuration
    pub fn new(config: PanoramaConfig) -> Self {
        let server = config.server.clone();
        Self {
            config: server,
            state: Arc::new(AppState::new(config)),
        }
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Check the configured directories before serving
    pub fn check_directories(&self) -> Result<(), ServerError> {
        let shell = &self.state.config.shell;
        for dir in [&shell.assets_dir, &shell.web_dir] {
            if dir.exists() && !dir.is_dir() {
                return Err(ServerError::Directory {
                    path: dir.display().to_string(),
                    reason: "not a directory".to_string(),
                });
            }
            if !dir.exists() {
                tracing::warn!(path = %dir.display(), "Directory missing, requests will 404");
            }
        }
        Ok(())
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("panorama server listening on {}", addr);
        self.run_with_listener(listener).await
    }

    /// Serve on an already bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        self.check_directories()?;

        // Dropped when serving ends, which stops the backends
        let backends = BackendSupervisor::start(
            &self.state.config.backends,
            self.state.loaded.clone(),
            SupervisorSettings::from_config(&self.config),
        );
        if !backends.is_empty() {
            tracing::info!(count = backends.len(), "Supervising plugin backends");
        }

        let router = create_router(self.state);
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_takes_address_from_config() {
        let mut config = PanoramaConfig::default();
        config.server = ServerConfig::new("0.0.0.0", 8080);

        let server = PanoramaServer::new(config);
        assert_eq!(server.config().addr(), "0.0.0.0:8080");
        assert!(server.state().is_known_plugin("discover"));
    }

    #[test]
    fn test_with_state_shares_state() {
        let state = Arc::new(AppState::default());
        let server = PanoramaServer::with_state(ServerConfig::default(), state.clone());
        assert!(Arc::ptr_eq(&server.state(), &state));
    }

    #[test]
    fn test_check_directories_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = PanoramaConfig::default();
        config.shell.assets_dir = file.path().to_path_buf();

        let server = PanoramaServer::new(config);
        assert!(matches!(
            server.check_directories(),
            Err(ServerError::Directory { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_reports_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let mut config = PanoramaConfig::default();
        config.server = ServerConfig::new("127.0.0.1", port);

        let result = PanoramaServer::new(config).run().await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}

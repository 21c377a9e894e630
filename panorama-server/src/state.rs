//! Shared server state

use chrono::{DateTime, Utc};
use panorama_core::PanoramaConfig;

use crate::backend::LoadedPlugins;

/// State shared by every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Host configuration the server was started with
    pub config: PanoramaConfig,
    /// When the server started
    pub started_at: DateTime<Utc>,
    /// Manifests of the plugin backends that are up
    pub loaded: LoadedPlugins,
}

impl AppState {
    pub fn new(config: PanoramaConfig) -> Self {
        Self {
            config,
            started_at: Utc::now(),
            loaded: LoadedPlugins::default(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    pub fn is_known_plugin(&self, id: &str) -> bool {
        self.config.plugin(id).is_some()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PanoramaConfig::default())
    }
}

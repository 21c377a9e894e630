use std::collections::BTreeMap;
use std::path::PathBuf;

use panorama_core::config::default_host_links;
use panorama_core::navigation::LinkMode;
use panorama_core::{BackendConfig, HostLink, PanoramaConfig};
use panorama_plugin_api::PluginDescriptor;
use serde::Deserialize;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPanoramaConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub shell: RawShellConfig,

    pub host_links: Option<Vec<HostLink>>,

    pub plugins: Option<Vec<PluginDescriptor>>,

    /// Merged per plugin id; a later layer replaces a whole entry
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend_ready_timeout_ms: Option<u64>,
    pub watch_debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawShellConfig {
    pub base_path: Option<String>,
    pub assets_dir: Option<PathBuf>,
    pub web_dir: Option<PathBuf>,
    pub load_timeout_ms: Option<u64>,
    pub ready_timeout_ms: Option<u64>,
    pub link_mode: Option<LinkMode>,
}

impl RawPanoramaConfig {
    /// Overlay values win wherever they are set
    pub fn merge(self, overlay: RawPanoramaConfig) -> RawPanoramaConfig {
        let mut backends = self.backends;
        backends.extend(overlay.backends);

        RawPanoramaConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(self.server.host),
                port: overlay.server.port.or(self.server.port),
                backend_ready_timeout_ms: overlay
                    .server
                    .backend_ready_timeout_ms
                    .or(self.server.backend_ready_timeout_ms),
                watch_debounce_ms: overlay
                    .server
                    .watch_debounce_ms
                    .or(self.server.watch_debounce_ms),
            },
            shell: RawShellConfig {
                base_path: overlay.shell.base_path.or(self.shell.base_path),
                assets_dir: overlay.shell.assets_dir.or(self.shell.assets_dir),
                web_dir: overlay.shell.web_dir.or(self.shell.web_dir),
                load_timeout_ms: overlay.shell.load_timeout_ms.or(self.shell.load_timeout_ms),
                ready_timeout_ms: overlay
                    .shell
                    .ready_timeout_ms
                    .or(self.shell.ready_timeout_ms),
                link_mode: overlay.shell.link_mode.or(self.shell.link_mode),
            },
            host_links: overlay.host_links.or(self.host_links),
            plugins: overlay.plugins.or(self.plugins),
            backends,
        }
    }

    /// Apply defaults for anything no layer set
    pub fn finalize(self) -> PanoramaConfig {
        let mut config = PanoramaConfig::default();
        let server = &mut config.server;
        if let Some(host) = self.server.host {
            server.host = host;
        }
        if let Some(port) = self.server.port {
            server.port = port;
        }
        if let Some(ms) = self.server.backend_ready_timeout_ms {
            server.backend_ready_timeout_ms = ms;
        }
        if let Some(ms) = self.server.watch_debounce_ms {
            server.watch_debounce_ms = ms;
        }

        let shell = &mut config.shell;
        if let Some(base_path) = self.shell.base_path {
            shell.base_path = base_path;
        }
        if let Some(dir) = self.shell.assets_dir {
            shell.assets_dir = dir;
        }
        if let Some(dir) = self.shell.web_dir {
            shell.web_dir = dir;
        }
        if let Some(ms) = self.shell.load_timeout_ms {
            shell.load_timeout_ms = ms;
        }
        if let Some(ms) = self.shell.ready_timeout_ms {
            shell.ready_timeout_ms = ms;
        }
        if let Some(mode) = self.shell.link_mode {
            shell.link_mode = mode;
        }

        config.host_links = self
            .host_links
            .unwrap_or_else(|| default_host_links(&config.shell.base_path));
        if let Some(plugins) = self.plugins {
            config.plugins = plugins;
        }
        config.backends = self.backends;
        config
    }
}

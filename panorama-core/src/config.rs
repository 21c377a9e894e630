//! Host configuration
//!
//! The resolved configuration with defaults applied. Layered loading from
//! user and project files lives in the CLI; this module only knows how to
//! parse one document and validate the result.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use panorama_plugin_api::PluginDescriptor;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::LoaderConfig;
use crate::navigation::{ComposerConfig, LinkMode};

/// Default port for the panorama server
pub const DEFAULT_PORT: u16 = 3000;

/// Default route prefix for plugin mounts
pub const DEFAULT_BASE_PATH: &str = "/app";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConfigDocument")]
pub struct PanoramaConfig {
    pub server: ServerConfig,

    pub shell: ShellConfig,

    /// Static host menu entries, rendered before plugin entries
    pub host_links: Vec<HostLink>,

    /// Plugins known to the host, in menu order
    pub plugins: Vec<PluginDescriptor>,

    /// Backend processes, keyed by the id of the plugin they serve
    pub backends: BTreeMap<String, BackendConfig>,
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            shell: ShellConfig::default(),
            host_links: default_host_links(DEFAULT_BASE_PATH),
            plugins: default_plugins(),
            backends: BTreeMap::new(),
        }
    }
}

/// One parsed document, before defaults that depend on other fields
#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    shell: ShellConfig,
    host_links: Option<Vec<HostLink>>,
    #[serde(default = "default_plugins")]
    plugins: Vec<PluginDescriptor>,
    #[serde(default)]
    backends: BTreeMap<String, BackendConfig>,
}

impl From<ConfigDocument> for PanoramaConfig {
    fn from(doc: ConfigDocument) -> Self {
        let host_links = doc
            .host_links
            .unwrap_or_else(|| default_host_links(&doc.shell.base_path));
        Self {
            server: doc.server,
            shell: doc.shell,
            host_links,
            plugins: doc.plugins,
            backends: doc.backends,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long a restarted backend has to answer `/manifest`
    pub backend_ready_timeout_ms: u64,
    /// Quiet period after a backend binary changes before restarting it
    pub watch_debounce_ms: u64,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Socket address string, e.g. `127.0.0.1:3000`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            backend_ready_timeout_ms: 5_000,
            watch_debounce_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Route prefix under which `:pluginId/*` activates a plugin
    pub base_path: String,
    /// Directory holding `{id}/style.css` and `{id}/{id}.js`
    pub assets_dir: PathBuf,
    /// Directory holding the host's `index.html`
    pub web_dir: PathBuf,
    pub load_timeout_ms: u64,
    pub ready_timeout_ms: u64,
    pub link_mode: LinkMode,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            assets_dir: PathBuf::from("./plugins"),
            web_dir: PathBuf::from("./web/dist"),
            load_timeout_ms: 30_000,
            ready_timeout_ms: 1_000,
            link_mode: LinkMode::default(),
        }
    }
}

/// A static entry in the host menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLink {
    pub label: String,
    pub to: String,
}

impl HostLink {
    pub fn new(label: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            to: to.into(),
        }
    }
}

/// A backend process serving one plugin over a unix socket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Executable, started with the socket path as its only argument
    pub binary_path: PathBuf,
    pub socket_path: PathBuf,
}

/// The Home link for a host mounted under `base_path`
pub fn default_host_links(base_path: &str) -> Vec<HostLink> {
    vec![HostLink::new(
        "Home",
        format!("{}/", base_path.trim_end_matches('/')),
    )]
}

fn default_plugins() -> Vec<PluginDescriptor> {
    vec![PluginDescriptor::new("discover", "Discover")]
}

impl PanoramaConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.shell.base_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "base_path must start with '/': {}",
                self.shell.base_path
            )));
        }

        let mut seen = HashSet::new();
        for plugin in &self.plugins {
            if plugin.id.trim().is_empty() {
                return Err(ConfigError::Invalid("plugin id must not be empty".to_string()));
            }
            if plugin.id.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "plugin id must not contain '/': {}",
                    plugin.id
                )));
            }
            if !seen.insert(plugin.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate plugin id: {}",
                    plugin.id
                )));
            }
        }

        for id in self.backends.keys() {
            if !seen.contains(id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "backend for unknown plugin: {id}"
                )));
            }
        }
        Ok(())
    }

    pub fn plugin(&self, id: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.id == id)
    }

    pub fn backend(&self, id: &str) -> Option<&BackendConfig> {
        self.backends.get(id)
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            load_timeout: Duration::from_millis(self.shell.load_timeout_ms),
            ready_timeout: Duration::from_millis(self.shell.ready_timeout_ms),
        }
    }

    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            base_path: self.shell.base_path.clone(),
            host_links: self.host_links.clone(),
            plugins: self.plugins.clone(),
            link_mode: self.shell.link_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = PanoramaConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.shell.base_path, "/app");
        assert_eq!(config.shell.assets_dir, PathBuf::from("./plugins"));
        assert_eq!(config.shell.load_timeout_ms, 30_000);
        assert_eq!(config.shell.ready_timeout_ms, 1_000);
        assert_eq!(config.shell.link_mode, LinkMode::Router);
        assert_eq!(config.host_links, vec![HostLink::new("Home", "/app/")]);
        assert_eq!(config.plugins, vec![PluginDescriptor::new("discover", "Discover")]);
        assert!(config.backends.is_empty());
        assert_eq!(config.server.backend_ready_timeout_ms, 5_000);
        assert_eq!(config, PanoramaConfig::default());
    }

    #[test]
    fn test_home_link_follows_base_path() {
        let config = PanoramaConfig::from_toml_str("[shell]\nbase_path = \"/portal/\"\n").unwrap();
        assert_eq!(config.host_links, vec![HostLink::new("Home", "/portal/")]);

        let router = crate::shell::Router::new(&config.shell.base_path);
        assert_eq!(router.resolve(&config.host_links[0].to), crate::Route::Home);
    }

    #[test]
    fn test_explicit_host_links_are_kept() {
        let config = PanoramaConfig::from_toml_str(
            r#"
[shell]
base_path = "/portal"

[[host_links]]
label = "Docs"
to = "/docs"
"#,
        )
        .unwrap();
        assert_eq!(config.host_links, vec![HostLink::new("Docs", "/docs")]);
    }

    #[test]
    fn test_parse_backends() {
        let config = PanoramaConfig::from_toml_str(
            r#"
[backends.discover]
binary_path = "./target/debug/discover"
socket_path = "/tmp/discover.sock"
"#,
        )
        .unwrap();
        let backend = config.backend("discover").unwrap();
        assert_eq!(backend.binary_path, PathBuf::from("./target/debug/discover"));
        assert_eq!(backend.socket_path, PathBuf::from("/tmp/discover.sock"));
        assert!(config.backend("stats").is_none());
    }

    #[test]
    fn test_rejects_backend_without_plugin() {
        let err = PanoramaConfig::from_toml_str(
            r#"
[backends.stats]
binary_path = "stats"
socket_path = "/tmp/stats.sock"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("backend for unknown plugin: stats"));
    }

    #[test]
    fn test_server_config_addr() {
        assert_eq!(ServerConfig::new("0.0.0.0", 8080).addr(), "0.0.0.0:8080");
        assert_eq!(ServerConfig::default().addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_parse_full_document() {
        let config = PanoramaConfig::from_toml_str(
            r#"
[server]
host = "0.0.0.0"
port = 8080

[shell]
base_path = "/apps"
link_mode = "document"
ready_timeout_ms = 250

[[host_links]]
label = "Start"
to = "/apps/"

[[plugins]]
id = "discover"
label = "Discover"

[[plugins]]
id = "stats"
label = "Stats"
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.shell.base_path, "/apps");
        assert_eq!(config.shell.link_mode, LinkMode::Document);
        assert_eq!(config.shell.load_timeout_ms, 30_000);
        assert_eq!(config.plugins.len(), 2);
        assert_eq!(config.plugin("stats").unwrap().label, "Stats");
        assert_eq!(config.loader_config().ready_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_duplicate_plugin_ids() {
        let err = PanoramaConfig::from_toml_str(
            r#"
[[plugins]]
id = "discover"
label = "A"

[[plugins]]
id = "discover"
label = "B"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate plugin id"));
    }

    #[test]
    fn test_rejects_empty_plugin_id() {
        let err = PanoramaConfig::from_toml_str(
            r#"
[[plugins]]
id = ""
label = "Nothing"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_relative_base_path() {
        let err = PanoramaConfig::from_toml_str("[shell]\nbase_path = \"app\"\n").unwrap_err();
        assert!(err.to_string().contains("base_path"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = PanoramaConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panorama.toml");
        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();

        let config = PanoramaConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 4000);

        let missing = PanoramaConfig::load_from_path(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}

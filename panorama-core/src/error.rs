//! Error types for panorama-core

use std::time::Duration;

use panorama_plugin_api::PluginError;
use thiserror::Error;

/// Top-level error type for panorama-core
#[derive(Error, Debug)]
pub enum PanoramaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("Shell error: {0}")]
    Shell(#[from] ShellError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

/// Errors from the host document model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Element not found: #{0}")]
    ElementNotFound(String),

    #[error("Element #{0} already has a shadow root")]
    ShadowAlreadyAttached(String),
}

/// Errors from loading a plugin
#[derive(Error, Debug)]
pub enum LoaderError {
    /// A style or script asset could not be fetched
    #[error("Failed to fetch asset {path}: {reason}")]
    AssetLoad { path: String, reason: String },

    /// No module is published under the specifier
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// The module has none of the accepted entry exports
    #[error("Module {specifier} has no entry export (expected one of: {expected})")]
    EntryMissing { specifier: String, expected: String },

    /// Nobody acknowledged the LOADING signal in time
    #[error("Host is not listening for plugin '{plugin_id}' (waited {waited:?})")]
    HostNotListening { plugin_id: String, waited: Duration },

    /// Fetching or importing took too long
    #[error("Loading plugin '{plugin_id}' timed out after {timeout:?}")]
    Timeout { plugin_id: String, timeout: Duration },

    /// The plugin's entry operation failed
    #[error("Plugin '{plugin_id}' failed to start: {source}")]
    Start {
        plugin_id: String,
        #[source]
        source: PluginError,
    },

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl LoaderError {
    pub fn asset(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors from the host shell
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Failed to load plugin '{plugin_id}': {source}")]
    Load {
        plugin_id: String,
        #[source]
        source: LoaderError,
    },

    #[error("Shell has been disposed")]
    Disposed,
}

/// Errors from host configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

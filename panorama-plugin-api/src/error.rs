//! Error types for plugin authors

use thiserror::Error;

/// Errors that plugins can return
#[derive(Error, Debug)]
pub enum PluginError {
    /// The startup config was unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// The container could not be rendered into
    #[error("Mount failed: {0}")]
    Mount(String),

    /// A route the plugin does not know
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl PluginError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a mount error
    pub fn mount(message: impl Into<String>) -> Self {
        Self::Mount(message.into())
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = PluginError::Config("missing basename".to_string());
        assert_eq!(config_err.to_string(), "Configuration error: missing basename");

        let mount_err = PluginError::Mount("container detached".to_string());
        assert_eq!(mount_err.to_string(), "Mount failed: container detached");

        let custom_err = PluginError::Custom("something happened".to_string());
        assert_eq!(custom_err.to_string(), "something happened");
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(PluginError::custom("x"), PluginError::Custom(_)));
        assert!(matches!(PluginError::config("x"), PluginError::Config(_)));
        assert!(matches!(PluginError::mount("x"), PluginError::Mount(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: PluginError = json_err.into();
        assert!(matches!(err, PluginError::Serialization(_)));
    }
}

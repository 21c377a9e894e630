//! XDG Base Directory paths for panorama.
//!
//! The CLI uses XDG paths on every platform, the same way tools like gh and
//! kubectl do, rather than platform-native locations.

use std::path::PathBuf;

/// File name of the user-level configuration
pub const CONFIG_FILE: &str = "config.toml";

/// Get the panorama config directory.
///
/// Returns `$XDG_CONFIG_HOME/panorama` if set, otherwise `~/.config/panorama`.
///
/// # Examples
///
/// ```
/// use panorama_paths::config_dir;
///
/// let config = config_dir();
/// let file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("panorama")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/panorama")
    } else {
        PathBuf::from(".config/panorama")
    }
}

/// Path of the user-level configuration file
pub fn user_config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

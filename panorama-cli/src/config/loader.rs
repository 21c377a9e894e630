use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use panorama_core::PanoramaConfig;

use super::types::RawPanoramaConfig;

/// Project config file, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "panorama.toml";

/// Env var overriding the project config location (useful for isolated tests)
pub const PROJECT_CONFIG_ENV: &str = "PANORAMA_PROJECT_CONFIG";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<PanoramaConfig> {
        Self::load_layers(&[Self::user_config_path(), Self::project_config_path()])
    }

    /// Merge the given files in order; missing files are skipped
    pub fn load_layers(paths: &[PathBuf]) -> Result<PanoramaConfig> {
        let mut raw = RawPanoramaConfig::default();
        for path in paths {
            if let Some(layer) = Self::read_layer(path)? {
                tracing::debug!(path = %path.display(), "Loaded config layer");
                raw = raw.merge(layer);
            }
        }

        let config = raw.finalize();
        config.validate()?;
        Ok(config)
    }

    fn read_layer(path: &Path) -> Result<Option<RawPanoramaConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let layer = toml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(layer))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        panorama_paths::user_config_file()
    }

    /// Get project config path
    pub fn project_config_path() -> PathBuf {
        std::env::var(PROJECT_CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(PROJECT_CONFIG_FILE))
    }
}

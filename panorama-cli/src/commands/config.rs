use std::path::Path;

use crate::config::ConfigLoader;
use anyhow::Result;
use clap::{Args, Subcommand};
use panorama_core::PanoramaConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration
    Show {
        /// Show built-in defaults instead of the merged files
        #[arg(long)]
        defaults: bool,
    },
    /// Show configuration file paths and whether they exist
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show { defaults } => show_config(defaults),
        ConfigCommands::Path => show_paths(),
    }
}

fn show_config(defaults: bool) -> Result<()> {
    let config = if defaults {
        PanoramaConfig::default()
    } else {
        ConfigLoader::load()?
    };
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn show_paths() -> Result<()> {
    println!("{}", describe("User config:   ", &ConfigLoader::user_config_path()));
    println!("{}", describe("Project config:", &ConfigLoader::project_config_path()));
    Ok(())
}

fn describe(label: &str, path: &Path) -> String {
    let marker = if path.exists() { "" } else { " (not found)" };
    format!("{label} {}{marker}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_marks_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let present = dir.path().join("panorama.toml");
        std::fs::write(&present, "").unwrap();

        assert!(!describe("Project config:", &present).ends_with("(not found)"));
        assert!(describe("Project config:", &dir.path().join("nope.toml")).ends_with("(not found)"));
    }

    #[test]
    fn test_defaults_serialize_to_toml() {
        let text = toml::to_string_pretty(&PanoramaConfig::default()).unwrap();
        assert!(text.contains("base_path = \"/app\""));
        assert!(text.contains("id = \"discover\""));
    }
}

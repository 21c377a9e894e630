//! List configured plugins and the state of their assets

use anyhow::Result;
use clap::Args;
use panorama_core::PanoramaConfig;
use panorama_core::loader::AssetPaths;

use crate::commands::menu::linked_modules;
use crate::config::ConfigLoader;

#[derive(Args)]
pub struct PluginsArgs {
    /// Also show asset paths
    #[arg(long)]
    pub paths: bool,
}

pub fn run(args: PluginsArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    for line in describe(&config, args.paths) {
        println!("{line}");
    }
    Ok(())
}

fn describe(config: &PanoramaConfig, paths: bool) -> Vec<String> {
    if config.plugins.is_empty() {
        return vec!["No plugins configured".to_string()];
    }

    let registry = linked_modules();
    let mut lines = Vec::new();
    for plugin in &config.plugins {
        let assets = AssetPaths::for_plugin(&plugin.id);
        let linked = if registry.contains(&assets.module) {
            "linked"
        } else {
            "not linked"
        };
        lines.push(format!(
            "{:<16} {:<20} {} ({linked})",
            plugin.id,
            plugin.label,
            plugin.mount_route(&config.shell.base_path)
        ));
        if let Some(backend) = config.backend(&plugin.id) {
            lines.push(format!(
                "  backend {} on {}",
                backend.binary_path.display(),
                backend.socket_path.display()
            ));
        }

        if paths {
            for asset in [&assets.style, &assets.module] {
                let file = config
                    .shell
                    .assets_dir
                    .join(asset.trim_start_matches(AssetPaths::PREFIX));
                let status = if file.exists() { "ok" } else { "missing" };
                lines.push(format!("  {asset} -> {} [{status}]", file.display()));
            }
        }
    }
    lines
}

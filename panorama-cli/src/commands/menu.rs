//! Boot a host shell in-process and print the composed menu
//!
//! Useful for checking a plugin's bundle and navigation tree without a
//! browser: `panorama menu /app/discover/browse`.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use panorama_core::loader::{AssetSource, DirAssetSource, HttpAssetSource, StaticModuleRegistry};
use panorama_core::{HostContext, PanoramaConfig, TextMenuSink};
use panorama_discover::Discover;

use crate::config::ConfigLoader;

#[derive(Args)]
pub struct MenuArgs {
    /// Host paths to visit before printing, in order
    pub paths: Vec<String>,

    /// Fetch plugin assets from a running server instead of assets_dir
    #[arg(long)]
    pub url: Option<String>,
}

/// Plugin modules compiled into this binary
pub fn linked_modules() -> StaticModuleRegistry {
    StaticModuleRegistry::new().with_plugin(panorama_discover::PLUGIN_ID, Arc::new(Discover))
}

pub async fn run(args: MenuArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let assets: Arc<dyn AssetSource> = match &args.url {
        Some(url) => Arc::new(HttpAssetSource::new(url)?),
        None => Arc::new(DirAssetSource::new(&config.shell.assets_dir)),
    };

    let text = compose(config, assets, &args.paths).await;
    println!("{text}");
    Ok(())
}

async fn compose(config: PanoramaConfig, assets: Arc<dyn AssetSource>, paths: &[String]) -> String {
    let ctx = HostContext::new(config, assets, Arc::new(linked_modules()));

    for path in paths {
        match ctx.navigate(path).await {
            Ok(route) => tracing::debug!(path = %path, route = ?route, "Visited"),
            Err(e) => tracing::warn!(path = %path, "Navigation failed: {}", e),
        }
    }
    ctx.shell().settle().await;

    let mut sink = TextMenuSink::new();
    ctx.render(&mut sink);
    ctx.dispose();
    sink.into_text()
}

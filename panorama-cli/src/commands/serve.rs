//! Run the panorama HTTP server
//!
//! Serves the host shell, plugin assets and the host config API, and keeps
//! configured plugin backends running. Flags override the merged
//! configuration for this run only.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use panorama_core::PanoramaConfig;
use panorama_server::PanoramaServer;
use tracing::info;

use crate::config::ConfigLoader;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Directory holding one sub-directory of assets per plugin
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    /// Directory holding the host's index.html
    #[arg(long)]
    pub web_dir: Option<PathBuf>,
}

impl ServeArgs {
    fn apply(&self, config: &mut PanoramaConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(dir) = &self.assets_dir {
            config.shell.assets_dir = dir.clone();
        }
        if let Some(dir) = &self.web_dir {
            config.shell.web_dir = dir.clone();
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    args.apply(&mut config);

    info!(
        addr = %config.server.addr(),
        base_path = %config.shell.base_path,
        plugins = config.plugins.len(),
        "Starting panorama server"
    );

    PanoramaServer::new(config).run().await.map_err(Into::into)
}

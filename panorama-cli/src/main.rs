use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "panorama", about = "Micro-frontend host shell")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Compose the host menu in-process and print it
    Menu(commands::menu::MenuArgs),
    /// List configured plugins
    Plugins(commands::plugins::PluginsArgs),
    /// Run the panorama server
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Config(args) => commands::config::run(args),
        Commands::Menu(args) => commands::menu::run(args).await,
        Commands::Plugins(args) => commands::plugins::run(args),
        Commands::Serve(args) => commands::serve::run(args).await,
    }
}

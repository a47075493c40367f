//! Proctor - Main Entry Point

use anyhow::Result;
use clap::Parser;
use proctor::config::ProctorConfig;
use proctor::{init_logging, install_metrics, run_script};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "proctor")]
#[command(
    about = "Interview integrity monitor - replays a scripted session against the backend",
    long_about = None
)]
struct Cli {
    /// JSON-lines script of frames and page inputs
    #[arg(long)]
    script: PathBuf,

    /// Configuration file (optional; PROCTOR__* variables override it)
    #[arg(long, default_value = "proctor.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ProctorConfig::load(&cli.config)?;
    init_logging(&config.logging);

    info!("=== Proctor v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = config.metrics_listen {
        install_metrics(addr)?;
    }

    let state = run_script(&config, &cli.script).await?;
    info!("Session finished: {}", state);

    Ok(())
}

//! LED Matrix Daemon
//!
//! Display server accepting raw frames and binary control messages over local
//! sockets and rendering them to an LED matrix panel.

mod config;
mod control;
mod frame;
mod server;
mod state;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use ledmatrix_hw::MemoryPanel;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use server::Server;

#[derive(Parser)]
#[command(name = "ledmatrixd")]
#[command(about = "Display server for LED matrix panels")]
#[command(version)]
struct Args {
    /// Configuration file (defaults are used when omitted)
    config: Option<PathBuf>,

    /// Do not render the startup test pattern
    #[arg(long)]
    no_test_pattern: bool,

    /// Frame endpoint, overriding the configuration
    #[arg(long)]
    frame_endpoint: Option<String>,

    /// Control endpoint, overriding the configuration
    #[arg(long)]
    control_endpoint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if args.no_test_pattern {
        config.test_pattern = false;
    }
    if let Some(endpoint) = args.frame_endpoint {
        config.endpoints.frame = endpoint;
    }
    if let Some(endpoint) = args.control_endpoint {
        config.endpoints.control = endpoint;
    }
    config.validate().context("Invalid configuration")?;

    let geometry = config.geometry()?;
    let panel = MemoryPanel::new(geometry.width, geometry.height)
        .context("Failed to initialize panel")?;

    let server = Server::start(&config, panel)?;
    info!(
        "Listening for frames on {} and control on {}",
        config.endpoints.frame, config.endpoints.control
    );

    // Setup Unix signal handlers
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
    }

    tokio::task::spawn_blocking(move || server.stop())
        .await
        .context("Failed to stop workers")?;

    Ok(())
}

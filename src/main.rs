//! Metronome console
//!
//! Terminal control page for a robot metronome: drives the device over HTTP
//! and shows its state as it changes.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use metronome_console::client::HttpStatusClient;
use metronome_console::config::AppConfig;
use metronome_console::controllers::Session;
use metronome_console::view::ConsoleView;

/// Metronome console - control a robot metronome from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Device base URL (overrides remote.base_url)
    #[arg(short, long, env = "METRONOME_URL")]
    url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting metronome console v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config.display());

    let mut config = AppConfig::load_or_default(&args.config).await?;
    if let Some(url) = args.url {
        config.remote.base_url = url;
        config.validate().context("Invalid --url")?;
    }

    let client = HttpStatusClient::new(&config.remote.base_url, config.request_timeout())?;
    info!("📡 Device: {}", client.base_url());

    let session = Session::spawn(
        Arc::new(client),
        Box::new(ConsoleView::new()),
        config.engine_settings(),
    );
    session.load().await;

    tokio::select! {
        result = cli::run_repl(&session, &config.recordings.download_dir) => {
            if let Err(e) = result {
                warn!("REPL stopped: {:#}", e);
            }
        }
        _ = shutdown_signal() => {}
    }

    session.shutdown();
    info!("Metronome console shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

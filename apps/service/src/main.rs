use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use healthcheck_service::{Config, Engine};

/// Periodically probe HTTP endpoints and report their health
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (.toml or .json); falls back to $HEALTHCHECK_CONFIG,
    /// then ./config.toml, then ./config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the loaded configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logger::init_with_level(if cli.verbose { logger::Level::DEBUG } else { logger::Level::INFO });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_config(cli.config.as_deref()).context("Error getting config")?;

    if cli.print_config {
        print!("{config}");
        return Ok(());
    }

    let settings = config.validate().context("Invalid configuration")?;
    let engine = Engine::new(settings).context("Failed to start health checker")?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    engine.run(&cancel).await;
    engine.report_final();

    Ok(())
}

/// Cancel `cancel` on the first SIGINT or SIGTERM
async fn shutdown_on_signal(cancel: CancellationToken) {
    if let Err(err) = wait_for_signal().await {
        error!(error = %err, "Failed to listen for shutdown signals");
        return;
    }
    info!("received shutdown signal");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

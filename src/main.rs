//! WebMarker - label the interactive elements of a live web page
//!
//! Main entry point for the WebMarker CLI.

mod cli;
mod cmd_mark;

use std::sync::OnceLock;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use webmarker_config::{ConfigLoader, LoggingConfig};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console (stderr) and rolling file output.
///
/// Stdout is reserved for command output.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let log_dir = logging.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(logging.file.as_str())
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes the file writer on exit.
    static GUARD: OnceLock<WorkerGuard> = OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, warnings) = ConfigLoader::load_validated(cli.config.as_deref(), |config| {
        if let Some(endpoint) = &cli.endpoint {
            config.browser.endpoint = endpoint.clone();
        }
        if let Some(target) = &cli.target {
            config.browser.target = Some(target.clone());
        }
    })
    .context("Failed to load configuration")?;

    init_tracing(&config.logging)?;
    for warning in &warnings {
        warn!("{}: {}", warning.path, warning.message);
    }

    match cli.command {
        Commands::Mark(args) => cmd_mark::handle_mark(config, args).await,
        Commands::Refresh(args) => cmd_mark::handle_refresh(config, args).await,
        Commands::Unmark => cmd_mark::handle_unmark(config).await,
        Commands::Status => cmd_mark::handle_status(config).await,
        Commands::Pages => cmd_mark::handle_pages(config).await,
    }
}

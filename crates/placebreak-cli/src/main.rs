//! Operator binary for the place-and-break patch.
//!
//! Opens the configured tag store and runs a single command against it:
//! tag, untag, show, check or move. Useful for inspecting a live server's
//! store and for reproducing exploit reports by hand.
//!
//! # Startup Sequence
//!
//! 1. Parse arguments
//! 2. Load configuration from the `--config` file (defaults if missing)
//! 3. Initialize structured logging (tracing)
//! 4. Build and connect the patch service
//! 5. Run the command and print its result

mod cli;
mod error;
mod run;

use std::path::Path;

use clap::Parser;
use placebreak_core::{PatchConfig, PatchService};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the store cannot be
/// reached, or the command fails.
#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let config = load_config(&cli.config, config_found)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    if config_found {
        info!(path = %cli.config.display(), "Loaded configuration");
    } else {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    let service = PatchService::from_config(&config)?;
    info!(backend = %service.store().kind(), "Connecting tag store");
    service.connect().await?;

    let result = run::execute(&service, cli.command).await;
    service.disconnect().await;

    let output = result?;
    println!("{output}");
    Ok(())
}

/// Read the config file, or fall back to defaults with environment overrides
/// when there is none.
fn load_config(path: &Path, found: bool) -> Result<PatchConfig, CliError> {
    if found {
        return Ok(PatchConfig::from_file(path)?);
    }
    let mut config = PatchConfig::default();
    config
        .data_source
        .dbms_server
        .apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

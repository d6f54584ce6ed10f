//! pagewatch - Single-Page Change Detector
//!
//! Fetches one web page, fingerprints its content with SHA-256, and emails a
//! notification when the fingerprint differs from the one recorded on the
//! previous run. Each invocation performs a single check; periodic monitoring
//! is left to an external scheduler such as cron or a systemd timer.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::ExitCode;

/// Resolve configuration and dispatch the requested subcommand.
///
/// Logging must already be initialized.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.resolved_command() {
        Commands::Check(args) => {
            let config = config
                .with_overrides(&args)
                .context("Invalid command-line override")?;
            commands::run_check(&config)
        }
        Commands::Status => commands::show_status(&config),
        Commands::Reset => commands::reset_history(&config),
    }
}

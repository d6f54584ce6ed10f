//! Command-line interface definitions for pagewatch.
//!
//! Global options (verbosity, config file) apply to every subcommand. Running
//! the binary without a subcommand performs a single check, which is what a
//! cron entry or systemd timer is expected to invoke.
//!
//! # Example
//!
//! ```bash
//! # One check using environment/config-file settings
//! pagewatch
//!
//! # Override the monitored page for this run
//! pagewatch check --url https://example.org/changelog
//!
//! # Show the stored baseline
//! pagewatch status
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Watch a single web page and email when its content changes.
///
/// Each invocation fetches the page once, compares its SHA-256 fingerprint with
/// the last recorded one, and sends a notification if it differs.
#[derive(Debug, Parser)]
#[command(name = "pagewatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a TOML configuration file
    ///
    /// Defaults to config.toml in the platform configuration directory.
    #[arg(long, global = true, value_name = "PATH", env = "PAGEWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute (defaults to `check`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run, falling back to a plain check.
    #[must_use]
    pub fn resolved_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Check(CheckArgs::default()))
    }
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Fetch the page once and notify if it changed
    Check(CheckArgs),
    /// Show the stored baseline
    Status,
    /// Delete the stored baseline so the next check starts fresh
    Reset,
}

/// Arguments for the check subcommand.
///
/// Each flag overrides the matching configuration value for this run only.
#[derive(Debug, Clone, Default, Args)]
pub struct CheckArgs {
    /// URL of the page to monitor
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Path of the JSON file holding the last fingerprint
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Fail instead of re-baselining when the history file is malformed
    #[arg(long)]
    pub strict_history: bool,
}

//! Subcommand implementations.
//!
//! Each command wires production collaborators from a resolved [`Config`].

use anyhow::{Context, Result};

use crate::config::Config;
use crate::error::ExitCode;
use crate::monitor::{
    CheckRecord, FileHistoryStore, HistoryError, HistoryStore, HttpFetcher, Monitor,
    SmtpNotifier,
};

/// Run one check against the configured page.
///
/// Fetch and notification failures are logged by the monitor and still count
/// as a completed run.
pub fn run_check(config: &Config) -> Result<ExitCode> {
    log::debug!("Resolved configuration: {:?}", config);

    let fetcher = HttpFetcher::new().context("Failed to build HTTP client")?;
    let history = FileHistoryStore::new(&config.history_file);
    let notifier = SmtpNotifier::new(config.smtp_settings());

    let mut monitor = Monitor::new(config.monitor_settings(), fetcher, history, notifier);
    let outcome = monitor.run_once().context("Check did not complete")?;

    log::debug!("Check finished: {}", outcome.label());
    Ok(ExitCode::Success)
}

/// Print the stored baseline.
pub fn show_status(config: &Config) -> Result<ExitCode> {
    let store = FileHistoryStore::new(&config.history_file);
    let loaded = match store.load() {
        Ok(record) => Ok(record),
        Err(e) if e.is_corrupt() => Err(e),
        Err(e) => return Err(e).context("Failed to read history"),
    };
    println!(
        "{}",
        format_status(&config.website_url, &store.location(), &loaded)
    );
    Ok(ExitCode::Success)
}

/// Delete the stored baseline.
pub fn reset_history(config: &Config) -> Result<ExitCode> {
    let mut store = FileHistoryStore::new(&config.history_file);
    let existed = store.path().exists();
    store.clear().context("Failed to reset history")?;
    if existed {
        log::info!("Removed history file {}", store.location());
    } else {
        log::info!("No history file at {}", store.location());
    }
    Ok(ExitCode::Success)
}

/// Render the status report shown by `pagewatch status`.
#[must_use]
pub fn format_status(
    url: &str,
    location: &str,
    record: &Result<CheckRecord, HistoryError>,
) -> String {
    let mut lines = vec![
        format!("URL:          {}", url),
        format!("History file: {}", location),
    ];
    match record {
        Ok(record) => match record.baseline() {
            Some(baseline) => {
                lines.push(format!("Last digest:  {}", baseline.digest));
                lines.push(format!("Last check:   {}", baseline.checked_at.to_rfc3339()));
            }
            None => lines.push("No baseline recorded".to_string()),
        },
        Err(e) => lines.push(format!("Unreadable:   {}", e)),
    }
    lines.join("\n")
}

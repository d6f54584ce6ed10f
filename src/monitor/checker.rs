//! Single-shot change check.
//!
//! [`Monitor::run_once`] walks the check state machine:
//!
//! ```text
//! FETCHING ─┬─> FETCH_FAILED                         (no read, no write)
//!           └─> FETCHED ─┬─> FIRST_RUN               save baseline
//!                        ├─> UNCHANGED               nothing
//!                        └─> CHANGED                 notify, then save
//! ```
//!
//! A failed notification does not stop the new digest from being saved, so a
//! change whose email was lost is not reported again on the next run.

use chrono::{DateTime, Local};
use thiserror::Error;

use super::fetcher::{ContentFetcher, FetchError};
use super::fingerprint::{fingerprint, Digest};
use super::history::{Baseline, CheckRecord, HistoryError, HistoryStore};
use super::notifier::{Notifier, NotifyError};

/// How to treat a history record that exists but cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Log a warning and start over as if no baseline existed.
    #[default]
    Lenient,
    /// Abort the check with an error.
    Strict,
}

/// Per-run settings for a [`Monitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Page to check.
    pub url: String,
    pub history_policy: HistoryPolicy,
}

/// Failures that end a check without a usable outcome.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The history could not be read or written.
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// What a completed check did.
#[derive(Debug)]
pub enum CheckOutcome {
    /// The page could not be retrieved; history was left untouched.
    FetchFailed(FetchError),
    /// No baseline existed; the current digest was saved.
    FirstRun { digest: Digest },
    /// The digest matched the baseline.
    Unchanged { digest: Digest },
    /// The digest differed; a notification was attempted and the new digest saved.
    Changed {
        previous: Baseline,
        current: Digest,
        notification: Result<(), NotifyError>,
    },
}

impl CheckOutcome {
    /// Whether a change notification was delivered.
    #[must_use]
    pub fn notified(&self) -> bool {
        matches!(
            self,
            Self::Changed {
                notification: Ok(()),
                ..
            }
        )
    }

    /// Short label for the state the check ended in.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::FetchFailed(_) => "fetch-failed",
            Self::FirstRun { .. } => "first-run",
            Self::Unchanged { .. } => "unchanged",
            Self::Changed { .. } => "changed",
        }
    }
}

/// Subject line of a change notification.
#[must_use]
pub fn change_subject(url: &str) -> String {
    format!("Website Changed: {}", url)
}

/// Body of a change notification.
#[must_use]
pub fn change_body(url: &str, previous_check: DateTime<Local>, now: DateTime<Local>) -> String {
    format!(
        "The website {url} has changed.\n\
         \n\
         Previous check: {}\n\
         Current check: {}\n\
         \n\
         Please check the website for updates.",
        previous_check.to_rfc3339(),
        now.to_rfc3339(),
    )
}

/// Change detector for one page.
///
/// Generic over its collaborators so the state machine can run against
/// in-memory fakes as well as HTTP, a JSON file and SMTP.
#[derive(Debug)]
pub struct Monitor<F, S, N> {
    settings: MonitorSettings,
    fetcher: F,
    history: S,
    notifier: N,
}

impl<F, S, N> Monitor<F, S, N>
where
    F: ContentFetcher,
    S: HistoryStore,
    N: Notifier,
{
    pub fn new(settings: MonitorSettings, fetcher: F, history: S, notifier: N) -> Self {
        Self {
            settings,
            fetcher,
            history,
            notifier,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    #[must_use]
    pub fn history(&self) -> &S {
        &self.history
    }

    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Take back the collaborators.
    pub fn into_parts(self) -> (F, S, N) {
        (self.fetcher, self.history, self.notifier)
    }

    /// Run one check.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::History`] if the new baseline cannot be saved, if
    /// the history cannot be read, or if it is malformed under
    /// [`HistoryPolicy::Strict`]. Fetch and notification failures are reported
    /// through the outcome instead.
    pub fn run_once(&mut self) -> Result<CheckOutcome, CheckError> {
        let url = self.settings.url.as_str();
        log::info!("Checking website: {}", url);

        let content = match self.fetcher.fetch(url) {
            Ok(content) => content,
            Err(e) => {
                log::error!("Error fetching website: {}", e);
                return Ok(CheckOutcome::FetchFailed(e));
            }
        };
        let current = fingerprint(&content);
        log::debug!(
            "Fetched {} bytes, digest {}",
            content.len(),
            current.short()
        );

        let record = self.load_record(&current)?;
        let Some(previous) = record.baseline().cloned() else {
            log::info!("First run, saving initial hash");
            self.history.save(&current)?;
            return Ok(CheckOutcome::FirstRun { digest: current });
        };

        if previous.digest == current {
            log::info!("No changes detected");
            return Ok(CheckOutcome::Unchanged { digest: current });
        }

        log::info!("Website content has changed!");
        log::debug!("Digest {} -> {}", previous.digest.short(), current.short());

        let subject = change_subject(url);
        let body = change_body(url, previous.checked_at, Local::now());
        let notification = self.notifier.send(&subject, &body);
        match &notification {
            Ok(()) => log::info!("Notification email sent successfully"),
            Err(e) => log::error!("Failed to send email: {}", e),
        }

        self.history.save(&current)?;
        Ok(CheckOutcome::Changed {
            previous,
            current,
            notification,
        })
    }

    fn load_record(&self, current: &Digest) -> Result<CheckRecord, CheckError> {
        match self.history.load() {
            Ok(record) => Ok(record),
            Err(e) if e.is_corrupt() && self.settings.history_policy == HistoryPolicy::Lenient => {
                match e.stranded_digest() {
                    Some(stranded) if stranded != current => log::warn!(
                        "{}; stored digest {} differs from current {}, change not notified, \
                         treating as first run",
                        e,
                        stranded.short(),
                        current.short()
                    ),
                    _ => log::warn!("{}; treating as first run", e),
                }
                Ok(CheckRecord::empty())
            }
            Err(e) => Err(e.into()),
        }
    }
}

//! Persistence of the last observed fingerprint.
//!
//! The store holds a single [`CheckRecord`]: the digest seen on the last
//! recorded check and when it was taken. No older digests are kept.
//!
//! On disk the record is a small JSON object:
//!
//! ```json
//! {"last_hash": "2cf24dba...", "last_check": "2025-03-01T09:30:00.123456+01:00"}
//! ```
//!
//! Both fields are `null` together or set together. Timestamps are written as
//! RFC 3339; naive ISO-8601 timestamps without an offset are accepted on read
//! and interpreted as local time.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::fingerprint::Digest;

/// Error type for history store operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history could not be read for a reason other than being absent.
    #[error("failed to read history from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The history could not be written.
    #[error("failed to write history to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The stored record exists but cannot be interpreted.
    ///
    /// `stranded_digest` is set when the record still names a digest but
    /// lacks its check time.
    #[error("history at {location} is malformed: {reason}")]
    Corrupt {
        location: String,
        reason: String,
        stranded_digest: Option<Digest>,
    },
}

impl HistoryError {
    /// Whether this error means the stored record is unreadable as data.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Digest left in a malformed record without its check time.
    #[must_use]
    pub fn stranded_digest(&self) -> Option<&Digest> {
        match self {
            Self::Corrupt {
                stranded_digest, ..
            } => stranded_digest.as_ref(),
            _ => None,
        }
    }
}

/// The digest recorded by a previous check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    /// Fingerprint of the page at that check.
    pub digest: Digest,
    /// When the check was recorded.
    pub checked_at: DateTime<Local>,
}

/// Last-known state of the monitored page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckRecord {
    baseline: Option<Baseline>,
}

impl CheckRecord {
    /// A record with no baseline, as before the first successful check.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A record holding `baseline`.
    #[must_use]
    pub fn with_baseline(baseline: Baseline) -> Self {
        Self {
            baseline: Some(baseline),
        }
    }

    #[must_use]
    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    #[must_use]
    pub fn last_digest(&self) -> Option<&Digest> {
        self.baseline.as_ref().map(|b| &b.digest)
    }

    #[must_use]
    pub fn last_check(&self) -> Option<DateTime<Local>> {
        self.baseline.as_ref().map(|b| b.checked_at)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.baseline.is_none()
    }
}

/// On-disk shape of a [`CheckRecord`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    last_hash: Option<Digest>,
    #[serde(default, with = "timestamp")]
    last_check: Option<DateTime<Local>>,
}

impl From<&CheckRecord> for HistoryFile {
    fn from(record: &CheckRecord) -> Self {
        Self {
            last_hash: record.last_digest().cloned(),
            last_check: record.last_check(),
        }
    }
}

impl TryFrom<HistoryFile> for CheckRecord {
    type Error = &'static str;

    fn try_from(file: HistoryFile) -> Result<Self, Self::Error> {
        match (file.last_hash, file.last_check) {
            (Some(digest), Some(checked_at)) => {
                Ok(CheckRecord::with_baseline(Baseline { digest, checked_at }))
            }
            (None, None) => Ok(CheckRecord::empty()),
            (Some(_), None) => Err("last_hash is set but last_check is missing"),
            (None, Some(_)) => Err("last_check is set but last_hash is missing"),
        }
    }
}

mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Local>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_some(&at.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Local>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }

    pub(super) fn parse(raw: &str) -> Result<DateTime<Local>, String> {
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Ok(at.with_timezone(&Local));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .ok_or_else(|| format!("invalid timestamp {raw:?}"))
    }
}

/// Storage for the single [`CheckRecord`].
pub trait HistoryStore {
    /// Read the stored record. An absent record is an empty one, not an error.
    fn load(&self) -> Result<CheckRecord, HistoryError>;

    /// Replace the stored record with `digest`, stamped with the current time.
    fn save(&mut self, digest: &Digest) -> Result<Baseline, HistoryError>;

    /// Remove the stored record.
    fn clear(&mut self) -> Result<(), HistoryError>;

    /// Human-readable location, for status output and log lines.
    fn location(&self) -> String;
}

/// JSON file-backed history store.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl ToString) -> HistoryError {
        HistoryError::Corrupt {
            location: self.location(),
            reason: reason.to_string(),
            stranded_digest: None,
        }
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self) -> Result<CheckRecord, HistoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No history file at {}", self.path.display());
                return Ok(CheckRecord::empty());
            }
            // Non-UTF-8 bytes are a content problem, not an access problem
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(self.corrupt(e));
            }
            Err(source) => {
                return Err(HistoryError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let file: HistoryFile = serde_json::from_str(&content).map_err(|e| self.corrupt(e))?;
        let stranded = match (&file.last_hash, &file.last_check) {
            (Some(digest), None) => Some(digest.clone()),
            _ => None,
        };
        CheckRecord::try_from(file).map_err(|reason| HistoryError::Corrupt {
            location: self.location(),
            reason: reason.to_string(),
            stranded_digest: stranded,
        })
    }

    fn save(&mut self, digest: &Digest) -> Result<Baseline, HistoryError> {
        let baseline = Baseline {
            digest: digest.clone(),
            checked_at: Local::now(),
        };
        let record = CheckRecord::with_baseline(baseline.clone());

        let write_err = |source| HistoryError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string(&HistoryFile::from(&record))
            .map_err(|e| write_err(io::Error::other(e)))?;
        fs::write(&self.path, json).map_err(write_err)?;

        log::debug!(
            "Saved digest {} to {}",
            baseline.digest.short(),
            self.path.display()
        );
        Ok(baseline)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(HistoryError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory history store.
///
/// Counts saves so callers can assert on persistence behaviour, and can be
/// put into a state where every load reports a corrupt record.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    record: CheckRecord,
    corrupt: bool,
    saves: usize,
}

impl MemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `digest` as its baseline.
    #[must_use]
    pub fn with_baseline(digest: Digest, checked_at: DateTime<Local>) -> Self {
        Self {
            record: CheckRecord::with_baseline(Baseline { digest, checked_at }),
            ..Self::default()
        }
    }

    /// A store whose loads fail as if the record were malformed.
    #[must_use]
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    /// The record as currently held.
    #[must_use]
    pub fn record(&self) -> &CheckRecord {
        &self.record
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<CheckRecord, HistoryError> {
        if self.corrupt {
            return Err(HistoryError::Corrupt {
                location: self.location(),
                reason: "record marked corrupt".to_string(),
                stranded_digest: None,
            });
        }
        Ok(self.record.clone())
    }

    fn save(&mut self, digest: &Digest) -> Result<Baseline, HistoryError> {
        let baseline = Baseline {
            digest: digest.clone(),
            checked_at: Local::now(),
        };
        self.record = CheckRecord::with_baseline(baseline.clone());
        self.corrupt = false;
        self.saves += 1;
        Ok(baseline)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.record = CheckRecord::empty();
        self.corrupt = false;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

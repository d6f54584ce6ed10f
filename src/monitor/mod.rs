//! Page change detection.
//!
//! # Architecture
//!
//! * [`fetcher`]: HTTP retrieval of the monitored page.
//! * [`fingerprint`]: SHA-256 digests of page text.
//! * [`history`]: persistence of the last digest and check time.
//! * [`notifier`]: SMTP delivery of change notifications.
//! * [`checker`]: the [`Monitor`] that sequences one check.
//!
//! Each I/O collaborator sits behind a trait ([`ContentFetcher`],
//! [`HistoryStore`], [`Notifier`]) so the check logic can be exercised without
//! a network or a filesystem.

pub mod checker;
pub mod fetcher;
pub mod fingerprint;
pub mod history;
pub mod notifier;

pub use checker::{
    change_body, change_subject, CheckError, CheckOutcome, HistoryPolicy, Monitor,
    MonitorSettings,
};
pub use fetcher::{ContentFetcher, FetchError, HttpFetcher, FETCH_TIMEOUT};
pub use fingerprint::{fingerprint, Digest, InvalidDigest};
pub use history::{
    Baseline, CheckRecord, FileHistoryStore, HistoryError, HistoryStore, MemoryHistoryStore,
};
pub use notifier::{Notifier, NotifyError, SmtpNotifier, SmtpSettings};

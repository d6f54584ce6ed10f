use super::common::{settings, RecordingNotifier, ReadOnlyStore, Reply, ScriptedFetcher, URL};
use chrono::{Local, TimeZone};
use pagewatch::monitor::{
    fingerprint, CheckError, CheckOutcome, HistoryPolicy, HistoryStore, MemoryHistoryStore,
    Monitor,
};

#[test]
fn test_first_run_saves_baseline_without_notification() {
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Lenient),
        ScriptedFetcher::bodies(["hello"]),
        MemoryHistoryStore::new(),
        RecordingNotifier::new(),
    );

    let outcome = monitor.run_once().unwrap();

    match outcome {
        CheckOutcome::FirstRun { digest } => assert_eq!(digest, fingerprint("hello")),
        other => panic!("Expected FirstRun, got {:?}", other),
    }
    assert_eq!(monitor.notifier().count(), 0);
    assert_eq!(monitor.history().save_count(), 1);
    assert_eq!(
        monitor.history().record().last_digest(),
        Some(&fingerprint("hello"))
    );
}

#[test]
fn test_unchanged_content_is_idempotent() {
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Lenient),
        ScriptedFetcher::bodies(["same", "same", "same"]),
        MemoryHistoryStore::new(),
        RecordingNotifier::new(),
    );

    assert!(matches!(
        monitor.run_once().unwrap(),
        CheckOutcome::FirstRun { .. }
    ));
    let baseline_time = monitor.history().record().last_check();

    for _ in 0..2 {
        let outcome = monitor.run_once().unwrap();
        assert!(matches!(outcome, CheckOutcome::Unchanged { .. }));
        assert!(!outcome.notified());
    }

    assert_eq!(monitor.notifier().count(), 0);
    // Unchanged runs do not rewrite the record, so the check time stays put
    assert_eq!(monitor.history().save_count(), 1);
    assert_eq!(monitor.history().record().last_check(), baseline_time);
}

#[test]
fn test_change_sends_one_notification_and_persists_new_digest() {
    let previous_check = Local.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Lenient),
        ScriptedFetcher::bodies(["world"]),
        MemoryHistoryStore::with_baseline(fingerprint("hello"), previous_check),
        RecordingNotifier::new(),
    );

    let outcome = monitor.run_once().unwrap();

    assert!(outcome.notified());
    match &outcome {
        CheckOutcome::Changed {
            previous, current, ..
        } => {
            assert_eq!(previous.digest, fingerprint("hello"));
            assert_eq!(previous.checked_at, previous_check);
            assert_eq!(current, &fingerprint("world"));
        }
        other => panic!("Expected Changed, got {:?}", other),
    }

    let sent = monitor.notifier().sent();
    assert_eq!(sent.len(), 1);
    let (subject, body) = &sent[0];
    assert_eq!(subject, &format!("Website Changed: {}", URL));
    assert!(body.starts_with(&format!("The website {} has changed.", URL)));
    assert!(body.contains(&format!("Previous check: {}", previous_check.to_rfc3339())));
    assert!(body.contains("Current check: "));

    assert_eq!(monitor.history().save_count(), 1);
    assert_eq!(
        monitor.history().record().last_digest(),
        Some(&fingerprint("world"))
    );
}

#[test]
fn test_fetch_failure_leaves_history_untouched() {
    let previous_check = Local.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Lenient),
        ScriptedFetcher::new([Reply::Status(500), Reply::Body("world")]),
        MemoryHistoryStore::with_baseline(fingerprint("hello"), previous_check),
        RecordingNotifier::new(),
    );

    let outcome = monitor.run_once().unwrap();
    assert!(matches!(outcome, CheckOutcome::FetchFailed(_)));
    assert_eq!(monitor.notifier().count(), 0);
    assert_eq!(monitor.history().save_count(), 0);

    // Next run still compares against the original baseline
    let outcome = monitor.run_once().unwrap();
    match outcome {
        CheckOutcome::Changed { previous, .. } => {
            assert_eq!(previous.digest, fingerprint("hello"));
        }
        other => panic!("Expected Changed, got {:?}", other),
    }
    assert_eq!(monitor.notifier().count(), 1);
}

#[test]
fn test_fetch_failure_skips_history_entirely() {
    // A corrupt store would error in strict mode if it were read at all
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Strict),
        ScriptedFetcher::new([Reply::Status(404)]),
        MemoryHistoryStore::corrupt(),
        RecordingNotifier::new(),
    );

    let outcome = monitor.run_once().unwrap();
    match outcome {
        CheckOutcome::FetchFailed(err) => assert!(err.to_string().contains("404")),
        other => panic!("Expected FetchFailed, got {:?}", other),
    }
    assert_eq!(monitor.history().save_count(), 0);
}

#[test]
fn test_notification_failure_still_persists_digest() {
    let previous_check = Local.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Lenient),
        ScriptedFetcher::bodies(["world", "world"]),
        MemoryHistoryStore::with_baseline(fingerprint("hello"), previous_check),
        RecordingNotifier::failing(),
    );

    let outcome = monitor.run_once().unwrap();
    match &outcome {
        CheckOutcome::Changed { notification, .. } => assert!(notification.is_err()),
        other => panic!("Expected Changed, got {:?}", other),
    }
    assert!(!outcome.notified());
    assert_eq!(
        monitor.history().record().last_digest(),
        Some(&fingerprint("world"))
    );

    // The lost notification is not retried
    assert!(matches!(
        monitor.run_once().unwrap(),
        CheckOutcome::Unchanged { .. }
    ));
    assert_eq!(monitor.notifier().count(), 1);
}

#[test]
fn test_corrupt_history_lenient_rebaselines() {
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Lenient),
        ScriptedFetcher::bodies(["hello"]),
        MemoryHistoryStore::corrupt(),
        RecordingNotifier::new(),
    );

    assert!(matches!(
        monitor.run_once().unwrap(),
        CheckOutcome::FirstRun { .. }
    ));
    assert_eq!(monitor.notifier().count(), 0);
    assert_eq!(monitor.history().save_count(), 1);
    assert!(monitor.history().load().is_ok());
}

#[test]
fn test_corrupt_history_strict_is_error() {
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Strict),
        ScriptedFetcher::bodies(["hello"]),
        MemoryHistoryStore::corrupt(),
        RecordingNotifier::new(),
    );

    match monitor.run_once() {
        Err(CheckError::History(e)) => assert!(e.is_corrupt()),
        other => panic!("Expected History error, got {:?}", other),
    }
    assert_eq!(monitor.history().save_count(), 0);
    assert_eq!(monitor.notifier().count(), 0);
}

#[test]
fn test_save_failure_is_error() {
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Lenient),
        ScriptedFetcher::bodies(["hello"]),
        ReadOnlyStore,
        RecordingNotifier::new(),
    );

    let err = monitor.run_once().unwrap_err();
    assert!(err.to_string().contains("failed to write history"));
    assert_eq!(monitor.notifier().count(), 0);
}

#[test]
fn test_each_run_fetches_exactly_once() {
    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Lenient),
        ScriptedFetcher::bodies(["a", "b"]),
        MemoryHistoryStore::new(),
        RecordingNotifier::new(),
    );
    monitor.run_once().unwrap();
    monitor.run_once().unwrap();
    assert_eq!(monitor.fetcher().calls(), 2);
    assert_eq!(monitor.notifier().count(), 1);
    assert_eq!(monitor.settings().url, URL);
}

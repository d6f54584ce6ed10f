use super::common::{settings, RecordingNotifier, Reply, ScriptedFetcher, URL};
use pagewatch::monitor::{
    fingerprint, CheckError, CheckOutcome, FileHistoryStore, HistoryPolicy, HistoryStore, Monitor,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// One process run: fresh collaborators, same history file.
fn run(path: &Path, reply: Reply, policy: HistoryPolicy) -> (CheckOutcome, RecordingNotifier) {
    let mut monitor = Monitor::new(
        settings(policy),
        ScriptedFetcher::new([reply]),
        FileHistoryStore::new(path),
        RecordingNotifier::new(),
    );
    let outcome = monitor.run_once().unwrap();
    let (_, _, notifier) = monitor.into_parts();
    (outcome, notifier)
}

#[test]
fn test_hello_then_world_scenario() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");

    let (outcome, notifier) = run(&path, Reply::Body("hello"), HistoryPolicy::Lenient);
    assert!(matches!(outcome, CheckOutcome::FirstRun { .. }));
    assert_eq!(notifier.count(), 0);
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"));

    let (outcome, notifier) = run(&path, Reply::Body("world"), HistoryPolicy::Lenient);
    assert!(matches!(outcome, CheckOutcome::Changed { .. }));
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].0.contains(URL));

    let stored = FileHistoryStore::new(&path).load().unwrap();
    assert_eq!(stored.last_digest(), Some(&fingerprint("world")));
}

#[test]
fn test_unchanged_run_does_not_rewrite_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");

    run(&path, Reply::Body("stable"), HistoryPolicy::Lenient);
    let before = fs::read_to_string(&path).unwrap();

    let (outcome, notifier) = run(&path, Reply::Body("stable"), HistoryPolicy::Lenient);
    assert!(matches!(outcome, CheckOutcome::Unchanged { .. }));
    assert_eq!(notifier.count(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_fetch_failure_creates_no_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");

    let (outcome, notifier) = run(&path, Reply::Status(502), HistoryPolicy::Lenient);
    assert!(matches!(outcome, CheckOutcome::FetchFailed(_)));
    assert_eq!(notifier.count(), 0);
    assert!(!path.exists());
}

#[test]
fn test_fetch_failure_keeps_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");

    run(&path, Reply::Body("hello"), HistoryPolicy::Lenient);
    let before = fs::read_to_string(&path).unwrap();

    run(&path, Reply::Status(500), HistoryPolicy::Lenient);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_legacy_history_file_is_compared() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");
    fs::write(
        &path,
        r#"{"last_hash": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824", "last_check": "2024-05-01T10:15:30.123456"}"#,
    )
    .unwrap();

    let (outcome, notifier) = run(&path, Reply::Body("hello"), HistoryPolicy::Lenient);
    assert!(matches!(outcome, CheckOutcome::Unchanged { .. }));
    assert_eq!(notifier.count(), 0);
}

#[test]
fn test_malformed_file_lenient_rebaselines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");
    fs::write(&path, "{\"last_hash\": ").unwrap();

    let (outcome, notifier) = run(&path, Reply::Body("hello"), HistoryPolicy::Lenient);
    assert!(matches!(outcome, CheckOutcome::FirstRun { .. }));
    assert_eq!(notifier.count(), 0);
    assert!(FileHistoryStore::new(&path).load().is_ok());
}

#[test]
fn test_malformed_file_strict_is_left_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");
    fs::write(&path, "{\"last_hash\": ").unwrap();

    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Strict),
        ScriptedFetcher::bodies(["hello"]),
        FileHistoryStore::new(&path),
        RecordingNotifier::new(),
    );
    assert!(matches!(
        monitor.run_once(),
        Err(CheckError::History(ref e)) if e.is_corrupt()
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"last_hash\": ");
}

#[test]
fn test_hash_without_check_time_lenient_rebaselines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");
    fs::write(
        &path,
        format!(
            r#"{{"last_hash": "{}", "last_check": null}}"#,
            fingerprint("hello")
        ),
    )
    .unwrap();

    let stranded = FileHistoryStore::new(&path).load().unwrap_err();
    assert_eq!(stranded.stranded_digest(), Some(&fingerprint("hello")));

    let (outcome, notifier) = run(&path, Reply::Body("world"), HistoryPolicy::Lenient);
    assert!(matches!(outcome, CheckOutcome::FirstRun { .. }));
    assert_eq!(notifier.count(), 0);

    let record = FileHistoryStore::new(&path).load().unwrap();
    assert_eq!(record.last_digest(), Some(&fingerprint("world")));
    assert!(record.last_check().is_some());
}

#[test]
fn test_hash_without_check_time_strict_is_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("website_history.json");
    let content = format!(
        r#"{{"last_hash": "{}", "last_check": null}}"#,
        fingerprint("hello")
    );
    fs::write(&path, &content).unwrap();

    let mut monitor = Monitor::new(
        settings(HistoryPolicy::Strict),
        ScriptedFetcher::bodies(["world"]),
        FileHistoryStore::new(&path),
        RecordingNotifier::new(),
    );
    match monitor.run_once() {
        Err(CheckError::History(e)) => {
            assert_eq!(e.stranded_digest(), Some(&fingerprint("hello")));
        }
        other => panic!("Expected History error, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

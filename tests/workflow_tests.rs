// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Export and apply workflows against an in-memory mailbox.

mod common;

use common::FakeStore;
use mailmark::csvfile::{load_message_ids, read_records, ExportWriter, MessageRecord};
use mailmark::gmail::LabelChange;
use mailmark::logging::RunLog;
use mailmark::workflow::{
    apply_label_change, list_all_messages, run_export, ApplyOptions, ExportOptions, WorkflowError, NO_SUBJECT,
    SUBJECT_ERROR,
};
use tempfile::TempDir;

fn export_options(page_size: u32) -> ExportOptions {
    ExportOptions { query: "is:unread".to_string(), page_size, progress_interval: 100 }
}

fn mark_read() -> ApplyOptions {
    ApplyOptions { change: LabelChange::mark_read(), dry_run: false, progress_interval: 100 }
}

async fn export_to(store: &FakeStore, dir: &TempDir, page_size: u32) -> std::path::PathBuf {
    let path = dir.path().join("emails.csv");
    run_export(store, || ExportWriter::create(&path), &export_options(page_size), &RunLog::disabled())
        .await
        .unwrap();
    path
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_pagination_returns_every_item_with_expected_call_count() {
    for (n, page_size, expected_calls) in [(0, 10, 1), (10, 10, 1), (11, 10, 2), (250, 100, 3), (7, 1, 7)] {
        let store = FakeStore::with_unread(n);
        let refs = list_all_messages(&store, "is:unread", page_size).await.unwrap();

        assert_eq!(refs.len(), n, "n={n} page_size={page_size}");
        assert_eq!(store.list_call_count(), expected_calls, "n={n} page_size={page_size}");
        let ids: Vec<String> = refs.into_iter().map(|r| r.id).collect();
        let expected: Vec<String> = (1..=n).map(|i| format!("msg-{i}")).collect();
        assert_eq!(ids, expected);
    }
}

#[tokio::test]
async fn test_listing_skips_read_messages() {
    let store = FakeStore::new();
    store.add("a", Some("one"), true);
    store.add("b", Some("two"), false);
    store.add("c", Some("three"), true);

    let ids: Vec<String> = list_all_messages(&store, "is:unread", 100)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["a", "c"]);
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn test_export_round_trips_awkward_subjects() {
    let subjects = [
        "Hello, world",
        "He said \"hi\"",
        "first line\nsecond line",
        "all, of \"the\"\r\nabove",
        "Ünïcödé ✓",
        "",
    ];
    let store = FakeStore::new();
    for (i, subject) in subjects.iter().enumerate() {
        store.add(&format!("id{i}"), Some(*subject), true);
    }
    let dir = TempDir::new().unwrap();
    let path = export_to(&store, &dir, 2).await;

    let records = read_records(std::fs::File::open(&path).unwrap()).unwrap();
    let expected: Vec<MessageRecord> = subjects
        .iter()
        .enumerate()
        .map(|(i, s)| MessageRecord::new(format!("id{i}"), *s))
        .collect();
    assert_eq!(records, expected);
}

#[tokio::test]
async fn test_export_sentinels_and_summary() {
    let store = FakeStore::new();
    store.add("has-subject", Some("Weekly digest"), true);
    store.add("no-subject", None, true);
    store.add("broken", Some("never seen"), true);
    let store = store.fail_metadata_for("broken");

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("emails.csv");
    let summary = run_export(&store, || ExportWriter::create(&path), &export_options(100), &RunLog::disabled())
        .await
        .unwrap();

    assert_eq!((summary.listed, summary.written), (3, 3));
    assert_eq!((summary.subject_missing, summary.subject_failed), (1, 1));

    let records = read_records(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(records[0].subject, "Weekly digest");
    assert_eq!(records[1].subject, NO_SUBJECT);
    assert_eq!(records[2].subject, SUBJECT_ERROR);
}

#[tokio::test]
async fn test_export_with_no_matches_writes_header_only() {
    let store = FakeStore::new();
    store.add("already-read", Some("old"), false);

    let dir = TempDir::new().unwrap();
    let path = export_to(&store, &dir, 100).await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Email ID,Subject\n");
    assert_eq!(store.metadata_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_subject_failures_are_isolated() {
    let store = FakeStore::with_unread(10).fail_metadata_for("msg-3").fail_metadata_for("msg-7");

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("emails.csv");
    let summary = run_export(&store, || ExportWriter::create(&path), &export_options(3), &RunLog::disabled())
        .await
        .unwrap();

    assert_eq!((summary.listed, summary.written), (10, 10));
    assert_eq!((summary.subject_missing, summary.subject_failed), (0, 2));
    assert_eq!(store.list_call_count(), 4);

    let records = read_records(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(records.len(), 10);
    for (n, record) in (1..=10).zip(&records) {
        assert_eq!(record.id, format!("msg-{n}"));
        if n == 3 || n == 7 {
            assert_eq!(record.subject, SUBJECT_ERROR, "msg-{n}");
        } else {
            assert_eq!(record.subject, format!("Subject {n}"));
        }
    }
}

#[tokio::test]
async fn test_listing_failure_keeps_previous_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("emails.csv");
    std::fs::write(&path, "Email ID,Subject\nm1,a\nm2,b\n").unwrap();

    let store = FakeStore::with_unread(4).fail_listing();
    let err = run_export(&store, || ExportWriter::create(&path), &export_options(2), &RunLog::disabled())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Listing { pages_fetched: 0, .. }));
    assert_eq!(load_message_ids(&path).unwrap(), vec!["m1".to_string(), "m2".to_string()]);
    assert_eq!(store.metadata_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

// ============================================================================
// Apply
// ============================================================================

#[tokio::test]
async fn test_export_then_apply_clears_unread() {
    let store = FakeStore::with_unread(25);
    let dir = TempDir::new().unwrap();
    let path = export_to(&store, &dir, 10).await;

    let ids = load_message_ids(&path).unwrap();
    assert_eq!(ids.len(), 25);

    let summary = apply_label_change(&store, &ids, &mark_read(), &RunLog::disabled())
        .await
        .unwrap();
    assert_eq!(summary.to_string(), "25 succeeded, 0 failed");
    assert_eq!(store.unread_count(), 0);
    assert_eq!(store.modified_ids(), ids);
}

#[tokio::test]
async fn test_apply_twice_is_idempotent() {
    let store = FakeStore::with_unread(5);
    let ids: Vec<String> = (1..=5).map(|i| format!("msg-{i}")).collect();

    let first = apply_label_change(&store, &ids, &mark_read(), &RunLog::disabled())
        .await
        .unwrap();
    let second = apply_label_change(&store, &ids, &mark_read(), &RunLog::disabled())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert!(!second.has_failures());
    assert_eq!(store.unread_count(), 0);
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let store = FakeStore::with_unread(10).fail_modify_for("msg-3").fail_modify_for("msg-7");
    let ids: Vec<String> = (1..=10).map(|i| format!("msg-{i}")).collect();

    let summary = apply_label_change(&store, &ids, &mark_read(), &RunLog::disabled())
        .await
        .unwrap();

    assert_eq!(summary.attempted, 10);
    assert_eq!(summary.succeeded, 8);
    let failed: Vec<&str> = summary.failed.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(failed, vec!["msg-3", "msg-7"]);
    for id in &ids {
        let should_still_be_unread = id == "msg-3" || id == "msg-7";
        assert_eq!(store.is_unread(id), should_still_be_unread, "{id}");
    }
}

#[tokio::test]
async fn test_partial_failure_summary() {
    let store = FakeStore::with_unread(5).fail_modify_for("msg-2");
    let ids: Vec<String> = (1..=5).map(|i| format!("msg-{i}")).collect();

    let summary = apply_label_change(&store, &ids, &mark_read(), &RunLog::disabled())
        .await
        .unwrap();
    assert_eq!(summary.to_string(), "4 succeeded, 1 failed");
    assert!(summary.has_failures());
}

#[tokio::test]
async fn test_unknown_id_is_a_per_item_failure() {
    let store = FakeStore::with_unread(2);
    let ids = vec!["msg-1".to_string(), "not-a-real-id".to_string(), "msg-2".to_string()];

    let summary = apply_label_change(&store, &ids, &mark_read(), &RunLog::disabled())
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed[0].id, "not-a-real-id");
    assert!(summary.failed[0].reason.contains("404"));
}

#[tokio::test]
async fn test_header_only_file_is_nothing_to_do() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("emails.csv");
    std::fs::write(&path, "Email ID,Subject\n").unwrap();

    let ids = load_message_ids(&path).unwrap();
    assert!(ids.is_empty());

    let store = FakeStore::with_unread(3);
    let summary = apply_label_change(&store, &ids, &mark_read(), &RunLog::disabled())
        .await
        .unwrap();
    assert_eq!(summary.attempted, 0);
    assert!(store.modified_ids().is_empty());
    assert_eq!(store.unread_count(), 3);
}

#[tokio::test]
async fn test_revoked_credentials_abort_the_run() {
    let store = FakeStore::with_unread(6).revoke_at("msg-4");
    let ids: Vec<String> = (1..=6).map(|i| format!("msg-{i}")).collect();

    let err = apply_label_change(&store, &ids, &mark_read(), &RunLog::disabled())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Aborted { processed: 3, total: 6, .. }));
    // Nothing after the fatal error is attempted.
    assert_eq!(store.modified_ids().len(), 4);
    assert_eq!(store.unread_count(), 3);
}

#[tokio::test]
async fn test_run_log_records_each_item() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("logs").join("apply.log");
    let run_log = RunLog::open(&log_path).unwrap();

    let store = FakeStore::with_unread(2).fail_modify_for("msg-2");
    let ids = vec!["msg-1".to_string(), "msg-2".to_string()];
    apply_label_change(&store, &ids, &mark_read(), &run_log).await.unwrap();

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains(" - Applied -UNREAD to msg-1"));
    assert!(contents.contains(" - Failed to update msg-2"));
    assert!(contents.contains(" - Run complete: 1 succeeded, 1 failed"));
}

//! Integration tests for collection storage.

mod common;

use stacktrack::{StackTrack, StackTrackError};
use std::collections::HashSet;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing_test::traced_test;

// ---------------------------------------------------------------------------
// create / list
// ---------------------------------------------------------------------------

#[test]
fn created_collection_is_listed_with_identical_fields() {
    let st = common::memory_stack();
    let created = st.collections().create("u1", "Favorites").unwrap();

    assert_eq!(created.name, "Favorites");
    assert_eq!(created.id.len(), stacktrack::store::DOCUMENT_ID_LEN);

    let listed = st.collections().list("u1").unwrap();
    assert_eq!(listed, vec![created]);
}

#[test]
fn list_is_newest_first() {
    let st = common::memory_stack();
    let a = st.collections().create("u1", "A").unwrap();
    let b = st.collections().create("u1", "B").unwrap();
    let c = st.collections().create("u1", "C").unwrap();

    assert!(a.created_at < b.created_at && b.created_at < c.created_at);

    let names: Vec<String> = st
        .collections()
        .list("u1")
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["C", "B", "A"]);
}

#[test]
fn equal_timestamps_keep_insertion_order() {
    let st = common::memory_stack();
    st.connection()
        .execute_batch(
            "INSERT INTO collections (uid, id, name, created_at_us) VALUES ('u1', 'zz-first', 'First', 5);
             INSERT INTO collections (uid, id, name, created_at_us) VALUES ('u1', 'aa-second', 'Second', 5);",
        )
        .unwrap();

    for _ in 0..5 {
        let ids: Vec<String> = st
            .collections()
            .list("u1")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["zz-first", "aa-second"]);
    }
}

#[test]
fn ids_are_unique_within_owner() {
    let st = common::memory_stack();
    let ids: HashSet<String> = (0..25)
        .map(|i| st.collections().create("u1", &format!("c{}", i)).unwrap().id)
        .collect();
    assert_eq!(ids.len(), 25);
}

#[test]
fn name_is_trimmed_and_blank_is_rejected() {
    let st = common::memory_stack();
    let c = st.collections().create("u1", "  Binder 1 ").unwrap();
    assert_eq!(c.name, "Binder 1");

    for blank in ["", "   ", "\t\n"] {
        let err = st.collections().create("u1", blank).unwrap_err();
        assert!(matches!(err, StackTrackError::Validation(_)));
    }
    assert_eq!(st.collections().list("u1").unwrap().len(), 1);
}

#[test]
fn get_returns_the_stored_collection() {
    let st = common::memory_stack();
    let c = st.collections().create("u1", "Trade binder").unwrap();
    assert_eq!(st.collections().get("u1", &c.id).unwrap(), Some(c));
    assert_eq!(st.collections().get("u1", "missing").unwrap(), None);
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[test]
fn owners_never_see_each_other() {
    let st = common::memory_stack();
    let mine = st.collections().create("u1", "Mine").unwrap();
    st.collections().create("u2", "Theirs").unwrap();

    let u1 = st.collections().list("u1").unwrap();
    assert_eq!(u1.len(), 1);
    assert_eq!(u1[0].name, "Mine");

    assert!(st.collections().get("u2", &mine.id).unwrap().is_none());

    // u2 deleting u1's id is a no-op for u1
    st.collections().delete("u2", &mine.id).unwrap();
    assert_eq!(st.collections().list("u1").unwrap().len(), 1);
}

#[test]
fn unknown_user_lists_empty() {
    let st = common::memory_stack();
    assert!(st.collections().list("nobody").unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

#[test]
fn delete_is_idempotent() {
    let st = common::memory_stack();
    let keep = st.collections().create("u1", "Keep").unwrap();
    let gone = st.collections().create("u1", "Gone").unwrap();

    st.collections().delete("u1", &gone.id).unwrap();
    st.collections().delete("u1", &gone.id).unwrap();
    st.collections().delete("u1", "never-existed").unwrap();

    assert_eq!(st.collections().list("u1").unwrap(), vec![keep]);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn collections_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("stacktrack.duckdb");

    let first = {
        let st = common::file_stack(&path);
        st.collections().create("u1", "Persisted").unwrap()
    };

    let st = common::file_stack(&path);
    assert_eq!(st.collections().list("u1").unwrap(), vec![first.clone()]);

    // New rows still sort after the persisted ones
    let later = st.collections().create("u1", "Later").unwrap();
    assert!(later.created_at > first.created_at);
    assert_eq!(st.collections().list("u1").unwrap()[0].id, later.id);
}

// ---------------------------------------------------------------------------
// Damaged rows
// ---------------------------------------------------------------------------

#[test]
#[traced_test]
fn unreadable_row_is_skipped_in_listing() {
    let st = common::memory_stack();
    let healthy = st.collections().create("u1", "Healthy").unwrap();
    st.connection()
        .execute_batch(
            "INSERT INTO collections (uid, id, name, created_at_us) VALUES ('u1', 'broken', NULL, 1)",
        )
        .unwrap();

    assert_eq!(st.collections().list("u1").unwrap(), vec![healthy]);
    assert!(logs_contain("skipping unreadable collection"));

    // The damaged record is still addressable for cleanup
    let err = st.collections().get("u1", "broken").unwrap_err();
    assert!(matches!(err, StackTrackError::StoreCorrupt(_)));
    assert!(!err.is_retryable());

    st.collections().delete("u1", "broken").unwrap();
    assert_eq!(st.collections().get("u1", "broken").unwrap(), None);
}

#[test]
fn missing_created_at_reads_as_epoch_and_sorts_last() {
    let st = common::memory_stack();
    st.connection()
        .execute_batch(
            "INSERT INTO collections (uid, id, name, created_at_us) VALUES ('u1', 'legacy', 'Legacy', NULL)",
        )
        .unwrap();
    let fresh = st.collections().create("u1", "Fresh").unwrap();

    let listed = st.collections().list("u1").unwrap();
    assert_eq!(listed[0].id, fresh.id);
    assert_eq!(listed[1].id, "legacy");
    assert_eq!(listed[1].created_at, chrono::DateTime::UNIX_EPOCH);
}

// ---------------------------------------------------------------------------
// Store timeout
// ---------------------------------------------------------------------------

#[test]
fn busy_store_fails_fast_with_retryable_error() {
    let timeout = Duration::from_millis(50);
    let st: StackTrack = StackTrack::builder()
        .store_timeout(timeout)
        .catalog(common::offline_catalog())
        .build()
        .unwrap();

    let (held_tx, held_rx) = mpsc::channel();
    let shared = &st;
    thread::scope(|scope| {
        scope.spawn(move || {
            shared
                .connection()
                .commit(|_| {
                    held_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(400));
                    Ok(())
                })
                .unwrap();
        });

        held_rx.recv().unwrap();
        let err = st.collections().list("u1").unwrap_err();
        assert!(matches!(err, StackTrackError::StoreBusy(t) if t == timeout));
        assert!(err.is_retryable());
    });

    // Once released the store serves again
    assert!(st.collections().list("u1").unwrap().is_empty());
}

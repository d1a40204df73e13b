// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::RequestQueue;
use sluice_core::{fingerprint, EnqueueRequest, KeyedRequest};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const QUEUE_NAME: &str = "request_queue";

fn open_queue(dir: &std::path::Path, capacity: usize) -> PersistedQueue<String> {
    PersistedQueue::open(dir, QUEUE_NAME, capacity).unwrap()
}

fn segment_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.join(QUEUE_NAME))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn fresh_open_creates_directory() {
    let dir = tempdir().unwrap();
    let queue = open_queue(dir.path(), 10);
    assert_eq!(queue.size(), 0);
    assert!(dir.path().join(QUEUE_NAME).is_dir());
}

#[test]
fn reopen_restores_items_and_order() {
    let dir = tempdir().unwrap();
    {
        let queue = open_queue(dir.path(), 10);
        queue.enqueue_keyed(10, "a".to_string()).unwrap();
        queue.enqueue_keyed(20, "b".to_string()).unwrap();
        queue.enqueue_keyed(30, "c".to_string()).unwrap();
        queue.close().unwrap();
    }

    let queue = open_queue(dir.path(), 10);
    assert_eq!(queue.size(), 3);
    assert_eq!(queue.dequeue().unwrap(), "a");
    assert_eq!(queue.dequeue().unwrap(), "b");
    assert_eq!(queue.dequeue().unwrap(), "c");
}

#[test]
fn reopen_rebuilds_key_set() {
    let dir = tempdir().unwrap();
    {
        let queue = open_queue(dir.path(), 3);
        queue.enqueue_keyed(10, "a".to_string()).unwrap();
        queue.enqueue_keyed(20, "b".to_string()).unwrap();
        queue.enqueue_keyed(30, "c".to_string()).unwrap();
        queue.close().unwrap();
    }

    let queue = open_queue(dir.path(), 3);
    assert_eq!(queue.size(), 3);
    // Resident key: reported admitted, nothing new stored.
    assert!(queue.enqueue_keyed(10, "a-again".to_string()).unwrap());
    assert_eq!(queue.size(), 3);
    // New key at capacity: full.
    assert!(!queue.enqueue_keyed(40, "d".to_string()).unwrap());
}

#[test]
fn dequeue_is_durable_without_close() {
    let dir = tempdir().unwrap();
    {
        // Dropped without close, as a crash would leave it.
        let queue = open_queue(dir.path(), 10);
        queue.enqueue_keyed(1, "a".to_string()).unwrap();
        queue.enqueue_keyed(2, "b".to_string()).unwrap();
        queue.enqueue_keyed(3, "c".to_string()).unwrap();
        queue.dequeue().unwrap();
    }

    let queue = open_queue(dir.path(), 10);
    assert_eq!(queue.size(), 2);
    // The popped key is free again; resident keys are not.
    assert!(queue.enqueue_keyed(1, "a2".to_string()).unwrap());
    assert_eq!(queue.size(), 3);
    queue.enqueue_keyed(2, "dup".to_string()).unwrap();
    assert_eq!(queue.size(), 3);
    assert_eq!(queue.dequeue().unwrap(), "b");
}

#[test]
fn segments_roll_and_drained_files_are_unlinked() {
    let dir = tempdir().unwrap();
    let queue = open_queue(dir.path(), 500);
    let total = SEGMENT_SIZE * 2 + 10;
    for i in 0..total {
        queue.enqueue(format!("job-{i}")).unwrap();
    }
    assert_eq!(segment_files(dir.path()).len(), 3);

    for i in 0..total {
        assert_eq!(queue.dequeue().unwrap(), format!("job-{i}"));
    }
    assert_eq!(queue.size(), 0);
    // Only the part-filled tail file may remain.
    assert!(segment_files(dir.path()).len() <= 1);
}

#[test]
fn popped_records_stay_popped_across_reopen_with_rolling() {
    let dir = tempdir().unwrap();
    {
        let queue = open_queue(dir.path(), 500);
        for i in 0..(SEGMENT_SIZE + 5) {
            queue.enqueue(format!("job-{i}")).unwrap();
        }
        for _ in 0..3 {
            queue.dequeue().unwrap();
        }
    }

    let queue = open_queue(dir.path(), 500);
    assert_eq!(queue.size(), SEGMENT_SIZE + 2);
    assert_eq!(queue.dequeue().unwrap(), "job-3");
}

#[test]
fn torn_tail_record_is_discarded() {
    let dir = tempdir().unwrap();
    {
        let queue = open_queue(dir.path(), 10);
        queue.enqueue_keyed(1, "a".to_string()).unwrap();
        queue.enqueue_keyed(2, "b".to_string()).unwrap();
    }

    // Simulate a crash mid-append: valid records followed by a torn line
    // with no trailing newline.
    let seg = dir.path().join(QUEUE_NAME).join(&segment_files(dir.path())[0]);
    let mut file = fs::OpenOptions::new().append(true).open(&seg).unwrap();
    file.write_all(br#"{"type":"push","key":3,"val"#).unwrap();
    drop(file);

    let queue = open_queue(dir.path(), 10);
    assert_eq!(queue.size(), 2);
    assert_eq!(queue.dequeue().unwrap(), "a");
    // The torn record never existed, so its key is free.
    assert!(queue.enqueue_keyed(3, "c".to_string()).unwrap());
}

#[test]
fn complete_corrupt_record_refuses_to_open() {
    let dir = tempdir().unwrap();
    {
        let queue = open_queue(dir.path(), 10);
        queue.enqueue("a".to_string()).unwrap();
    }

    let seg = dir.path().join(QUEUE_NAME).join(&segment_files(dir.path())[0]);
    let mut file = fs::OpenOptions::new().append(true).open(&seg).unwrap();
    file.write_all(b"definitely not a record\n").unwrap();
    drop(file);

    let err = PersistedQueue::<String>::open(dir.path(), QUEUE_NAME, 10).unwrap_err();
    assert!(matches!(err, QueueError::Open { .. }));
}

#[test]
fn clear_removes_items_keys_and_files() {
    let dir = tempdir().unwrap();
    let queue = open_queue(dir.path(), 10);
    queue.enqueue_keyed(1, "a".to_string()).unwrap();
    queue.enqueue_keyed(2, "b".to_string()).unwrap();
    queue.clear().unwrap();

    assert_eq!(queue.size(), 0);
    assert!(segment_files(dir.path()).is_empty());
    assert!(queue.enqueue_keyed(1, "a2".to_string()).unwrap());
}

#[test]
fn operations_after_close_fail() {
    let dir = tempdir().unwrap();
    let queue = open_queue(dir.path(), 10);
    queue.enqueue("a".to_string()).unwrap();
    queue.close().unwrap();

    assert!(matches!(
        queue.enqueue("b".to_string()),
        Err(QueueError::Closed)
    ));
    assert!(matches!(queue.dequeue(), Err(QueueError::Closed)));
    assert!(matches!(queue.clear(), Err(QueueError::Closed)));
    assert!(matches!(queue.close(), Err(QueueError::Closed)));
}

#[test]
fn close_wakes_blocked_dequeue() {
    let dir = tempdir().unwrap();
    let queue = Arc::new(open_queue(dir.path(), 10));
    let consumer = {
        let queue = Arc::clone(&queue);
        std::thread::spawn(move || queue.dequeue())
    };

    std::thread::sleep(Duration::from_millis(50));
    queue.close().unwrap();

    assert!(matches!(consumer.join().unwrap(), Err(QueueError::Closed)));
}

#[test]
fn snapshot_preserves_order_without_mutation() {
    let dir = tempdir().unwrap();
    let queue = open_queue(dir.path(), 10);
    queue.enqueue("a".to_string()).unwrap();
    queue.enqueue("b".to_string()).unwrap();
    let snap = queue.snapshot().unwrap();
    assert_eq!(snap, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(queue.size(), 2);
}

#[test]
fn keyed_request_payload_survives_restart() {
    let dir = tempdir().unwrap();
    let raw = br#"{"model_id":"m","run_id":"r","data_paths":["/a"],"extra":1}"#;
    let keyed = KeyedRequest {
        request: EnqueueRequest::parse(raw).unwrap(),
        request_key: fingerprint(raw),
        enqueue_time_ms: 1_700_000_000_000,
        label_override: vec![],
    };

    {
        let queue: PersistedQueue<KeyedRequest> =
            PersistedQueue::open(dir.path(), QUEUE_NAME, 10).unwrap();
        queue.enqueue_keyed(keyed.request_key, keyed.clone()).unwrap();
        queue.close().unwrap();
    }

    let queue: PersistedQueue<KeyedRequest> =
        PersistedQueue::open(dir.path(), QUEUE_NAME, 10).unwrap();
    let restored = queue.dequeue().unwrap();
    assert_eq!(restored, keyed);
    assert!(restored.request.raw.contains("extra"));
}

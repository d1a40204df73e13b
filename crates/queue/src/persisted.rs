// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disk-backed bounded FIFO with duplicate suppression.
//!
//! The queue owns a directory of segment files (see [`crate::segment`]).
//! Resident items are mirrored in memory for fast size/snapshot and for the
//! blocking dequeue; the directory is the durable record. An operation
//! returns only after its record is fsynced, so the state replayed after a
//! crash is exactly the state as of the last completed operation.

use crate::segment::{parse_segment_index, replay_segment, Record, Segment, SEGMENT_SIZE};
use crate::{QueueError, QueueItem, RequestQueue};
use parking_lot::{Condvar, Mutex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct Inner<T> {
    items: VecDeque<QueueItem<T>>,
    keys: HashSet<i32>,
    segments: VecDeque<Segment>,
    next_index: u64,
    closed: bool,
}

/// Size-capped FIFO journaled to a directory of segment files.
#[derive(Debug)]
pub struct PersistedQueue<T> {
    capacity: usize,
    dir: PathBuf,
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

impl<T> PersistedQueue<T>
where
    T: DeserializeOwned,
{
    /// Open the queue at `dir/name`, creating it if absent.
    ///
    /// An existing directory is replayed in full: resident items are loaded
    /// in admission order and the dedup key set is rebuilt from them. Any
    /// complete record that fails to decode aborts the open — refusing to
    /// start beats silently dropping entries.
    pub fn open(dir: &Path, name: &str, capacity: usize) -> Result<Self, QueueError> {
        let root = dir.join(name);
        let open_err = |message: String| QueueError::Open {
            path: root.clone(),
            message,
        };

        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| open_err(e.to_string()))?;
            info!(path = %root.display(), "created fresh request queue");
        }

        let mut indices = Vec::new();
        let entries = fs::read_dir(&root).map_err(|e| open_err(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| open_err(e.to_string()))?;
            if let Some(index) = entry.file_name().to_str().and_then(parse_segment_index) {
                indices.push(index);
            }
        }
        indices.sort_unstable();

        let mut items = VecDeque::new();
        let mut keys = HashSet::new();
        let mut segments = VecDeque::new();
        let mut next_index = 1u64;

        for &index in &indices {
            let mut segment = Segment::new(&root, index);
            let replay = replay_segment::<T>(&segment.path).map_err(open_err)?;
            next_index = index + 1;

            if replay.pops == replay.items.len() {
                // Nothing resident. A dead segment only survives a crash
                // between its final tombstone and the unlink.
                fs::remove_file(&segment.path).map_err(|e| open_err(e.to_string()))?;
                continue;
            }

            for item in replay.items.iter().skip(replay.pops) {
                if item.key != 0 {
                    keys.insert(item.key);
                }
            }
            segment.pushes = replay.items.len();
            segment.pops = replay.pops;
            segment.bytes = replay.bytes;
            items.extend(replay.items.into_iter().skip(replay.pops));
            segments.push_back(segment);
        }

        debug!(
            path = %root.display(),
            resident = items.len(),
            keys = keys.len(),
            "replayed request queue",
        );

        Ok(Self {
            capacity,
            dir: root,
            inner: Mutex::new(Inner {
                items,
                keys,
                segments,
                next_index,
                closed: false,
            }),
            available: Condvar::new(),
        })
    }
}

impl<T> PersistedQueue<T>
where
    T: Clone + Serialize,
{
    fn push(&self, key: i32, value: T) -> Result<bool, QueueError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(QueueError::Closed);
        }
        if key != 0 && inner.keys.contains(&key) {
            return Ok(true);
        }
        if inner.items.len() >= self.capacity {
            return Ok(false);
        }

        // Pops only ever land in the segment holding the head, so a full
        // tail is never appended to again; roll to a fresh one.
        let needs_roll = inner
            .segments
            .back()
            .map(|s| s.pushes == SEGMENT_SIZE)
            .unwrap_or(true);
        if needs_roll {
            let index = inner.next_index;
            inner.next_index += 1;
            inner.segments.push_back(Segment::new(&self.dir, index));
        }

        let Some(tail) = inner.segments.back_mut() else {
            return Err(QueueError::Enqueue("segment roll failed".to_string()));
        };
        tail.append(&Record::Push {
            key,
            value: value.clone(),
        })
        .map_err(|e| QueueError::Enqueue(e.to_string()))?;

        inner.items.push_back(QueueItem { key, value });
        if key != 0 {
            inner.keys.insert(key);
        }
        self.available.notify_one();
        Ok(true)
    }
}

impl<T> RequestQueue<T> for PersistedQueue<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    fn enqueue(&self, value: T) -> Result<bool, QueueError> {
        self.push(0, value)
    }

    fn enqueue_keyed(&self, key: i32, value: T) -> Result<bool, QueueError> {
        self.push(key, value)
    }

    fn dequeue(&self) -> Result<T, QueueError> {
        let mut inner = self.inner.lock();
        loop {
            if inner.closed {
                return Err(QueueError::Closed);
            }
            if !inner.items.is_empty() {
                break;
            }
            self.available.wait(&mut inner);
        }

        // The front segment holds the head: drained predecessors are
        // unlinked as soon as they drain.
        let (drained, full) = {
            let Some(head) = inner.segments.front_mut() else {
                return Err(QueueError::Dequeue(
                    "no segment holds the queue head".to_string(),
                ));
            };
            head.append(&Record::<T>::Pop)
                .map_err(|e| QueueError::Dequeue(e.to_string()))?;
            (head.drained(), head.pushes == SEGMENT_SIZE)
        };

        // The tombstone is durable; everything past this point is cleanup.
        let last = inner.segments.len() == 1;
        if drained && (full || !last) {
            // A tail still short of capacity keeps its file for appends. A
            // failed unlink is retried at the next open, which drops fully
            // drained segments.
            if let Some(segment) = inner.segments.pop_front() {
                if let Err(e) = fs::remove_file(&segment.path) {
                    warn!(
                        path = %segment.path.display(),
                        error = %e,
                        "failed to unlink drained segment",
                    );
                }
            }
        }

        let Some(item) = inner.items.pop_front() else {
            return Err(QueueError::Dequeue("queue head vanished".to_string()));
        };
        if item.key != 0 {
            inner.keys.remove(&item.key);
        }
        Ok(item.value)
    }

    fn clear(&self) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(QueueError::Closed);
        }
        for segment in inner.segments.drain(..) {
            fs::remove_file(&segment.path)
                .map_err(|e| QueueError::Dequeue(format!("failed to clear queue: {e}")))?;
        }
        inner.items.clear();
        inner.keys.clear();
        Ok(())
    }

    fn close(&self) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(QueueError::Closed);
        }
        // Every record is already fsynced; closing just fences off the
        // directory and releases blocked consumers.
        inner.closed = true;
        self.available.notify_all();
        Ok(())
    }

    fn size(&self) -> usize {
        self.inner.lock().items.len()
    }

    fn snapshot(&self) -> Result<Vec<T>, QueueError> {
        let inner = self.inner.lock();
        Ok(inner.items.iter().map(|i| i.value.clone()).collect())
    }
}

#[cfg(test)]
#[path = "persisted_tests.rs"]
mod tests;

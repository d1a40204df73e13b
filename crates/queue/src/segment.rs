// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Segment files backing the persisted queue.
//!
//! A segment is an append-only file of JSON-line records. An admission
//! appends a `push` record carrying the item; a removal appends a `pop`
//! tombstone to the segment holding the current head. Replaying a segment
//! therefore yields its item records in admission order minus the first
//! `pops` of them.
//!
//! Every append is fsynced before the operation reports success. A crash
//! mid-append can leave a torn final line without a trailing newline; that
//! record never completed, so replay discards it. Any *complete* line that
//! fails to decode is corruption and aborts the replay.

use crate::QueueItem;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Maximum number of item records per segment file.
pub const SEGMENT_SIZE: usize = 50;

const SEGMENT_PREFIX: &str = "segment-";
const SEGMENT_SUFFIX: &str = ".jsonl";

/// One record line in a segment file.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Record<T> {
    Push { key: i32, value: T },
    Pop,
}

/// On-disk state of one segment, tracked in memory between operations.
#[derive(Debug)]
pub(crate) struct Segment {
    pub index: u64,
    pub path: PathBuf,
    /// Item records written to the file.
    pub pushes: usize,
    /// Pop tombstones written to the file.
    pub pops: usize,
    /// File length after the last good record; used to cut off a failed
    /// append.
    pub bytes: u64,
}

impl Segment {
    pub fn new(dir: &Path, index: u64) -> Self {
        Self {
            index,
            path: segment_path(dir, index),
            pushes: 0,
            pops: 0,
            bytes: 0,
        }
    }

    /// True once every item record has a matching tombstone.
    pub fn drained(&self) -> bool {
        self.pops == self.pushes
    }

    /// Serialize and append one record, fsyncing before returning.
    ///
    /// On failure the file is cut back to the last good record so a torn
    /// line cannot garble a later append.
    pub fn append<T: Serialize>(&mut self, record: &Record<T>) -> io::Result<()> {
        let mut line = serde_json::to_vec(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        line.push(b'\n');

        let result = (|| {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            file.write_all(&line)?;
            file.sync_all()?;
            Ok::<(), io::Error>(())
        })();

        match result {
            Ok(()) => {
                self.bytes += line.len() as u64;
                match record {
                    Record::Push { .. } => self.pushes += 1,
                    Record::Pop => self.pops += 1,
                }
                Ok(())
            }
            Err(e) => {
                if let Err(trunc_err) = truncate_to(&self.path, self.bytes) {
                    warn!(
                        path = %self.path.display(),
                        error = %trunc_err,
                        "failed to cut back segment after a failed append",
                    );
                }
                Err(e)
            }
        }
    }
}

/// Path of the segment with the given creation index.
pub(crate) fn segment_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{SEGMENT_PREFIX}{index:09}{SEGMENT_SUFFIX}"))
}

/// Extract the creation index from a segment file name.
pub(crate) fn parse_segment_index(name: &str) -> Option<u64> {
    name.strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_SUFFIX)?
        .parse()
        .ok()
}

/// Outcome of replaying one segment file.
pub(crate) struct SegmentReplay<T> {
    /// Item records in admission order (including popped ones).
    pub items: Vec<QueueItem<T>>,
    pub pops: usize,
    /// Valid file length (after any torn-tail truncation).
    pub bytes: u64,
}

/// Replay a segment file, truncating a torn final line and failing on any
/// complete record that does not decode.
pub(crate) fn replay_segment<T: DeserializeOwned>(
    path: &Path,
) -> Result<SegmentReplay<T>, String> {
    let mut data = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut data))
        .map_err(|e| format!("{}: {e}", path.display()))?;

    // A trailing chunk without a newline is an append that never finished;
    // the record is wholly absent. Cut it off so it cannot garble later
    // appends.
    let valid_len = match data.iter().rposition(|&b| b == b'\n') {
        Some(pos) => pos + 1,
        None => 0,
    };
    if valid_len < data.len() {
        warn!(
            path = %path.display(),
            discarded = data.len() - valid_len,
            "discarding torn record at segment tail",
        );
        truncate_to(path, valid_len as u64).map_err(|e| format!("{}: {e}", path.display()))?;
        data.truncate(valid_len);
    }

    let mut items = Vec::new();
    let mut pops = 0usize;
    for (line_no, line) in data.split(|&b| b == b'\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        let record: Record<T> = serde_json::from_slice(line).map_err(|e| {
            format!("{} line {}: {e}", path.display(), line_no + 1)
        })?;
        match record {
            Record::Push { key, value } => items.push(QueueItem { key, value }),
            Record::Pop => pops += 1,
        }
    }

    if pops > items.len() {
        return Err(format!(
            "{}: {} tombstones for {} records",
            path.display(),
            pops,
            items.len()
        ));
    }

    Ok(SegmentReplay {
        items,
        pops,
        bytes: valid_len as u64,
    })
}

fn truncate_to(path: &Path, len: u64) -> io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_all()
}

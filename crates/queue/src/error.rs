// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue has been closed; no further operations are possible.
    #[error("queue is closed")]
    Closed,

    /// The backing directory could not be opened or replayed.
    #[error("failed to open queue at {path}: {message}")]
    Open { path: PathBuf, message: String },

    /// The admission could not be made durable. The item was not admitted.
    #[error("failed to append queue record: {0}")]
    Enqueue(String),

    /// The removal could not be made durable. The item remains at the head
    /// and the caller may retry.
    #[error("failed to remove queue head: {0}")]
    Dequeue(String),
}

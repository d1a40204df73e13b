// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the dispatch engine

use sluice_adapters::AdapterError;
use sluice_core::RequestError;
use sluice_queue::QueueError;
use thiserror::Error;

/// Errors surfaced by dispatcher operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Retry requested for a run the tracker still considers in flight.
    #[error("flow {0} has not finished yet")]
    FlowNotDone(String),

    /// Admission refused: the queue is at capacity.
    #[error("request queue full")]
    QueueFull,

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Request(#[from] RequestError),
}

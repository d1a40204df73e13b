// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight run tracking.
//!
//! Maps orchestrator-assigned run ids to the request that produced them.
//! The map is not durable: a restart forgets in-flight runs, which then
//! finish unreported. Accessors hand out copies so no caller ever holds
//! the lock across an HTTP call.

use parking_lot::Mutex;
use sluice_core::EnqueueRequest;
use std::collections::HashMap;

/// A dispatched run awaiting a terminal state.
#[derive(Debug, Clone)]
pub struct TrackedFlow {
    pub request: EnqueueRequest,
    /// Dispatch wall-clock, ms since epoch.
    pub start_time_ms: u64,
}

/// Run-id → request map for dispatched, unfinished runs.
#[derive(Default)]
pub struct FlowTracker {
    inner: Mutex<HashMap<String, TrackedFlow>>,
}

impl FlowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, run_id: impl Into<String>, request: EnqueueRequest, start_time_ms: u64) {
        self.inner.lock().insert(
            run_id.into(),
            TrackedFlow {
                request,
                start_time_ms,
            },
        );
    }

    /// Copy of the tracked run ids.
    pub fn ids(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }

    /// Copy of one entry.
    pub fn get(&self, run_id: &str) -> Option<TrackedFlow> {
        self.inner.lock().get(run_id).cloned()
    }

    pub fn contains(&self, run_id: &str) -> bool {
        self.inner.lock().contains_key(run_id)
    }

    pub fn remove(&self, run_id: &str) -> Option<TrackedFlow> {
        self.inner.lock().remove(run_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;

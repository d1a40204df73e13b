// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state handed to every HTTP handler.

use sluice_core::{Clock, KeyedRequest};
use sluice_engine::DispatchRunner;
use sluice_queue::RequestQueue;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn RequestQueue<KeyedRequest>>,
    pub runner: Arc<DispatchRunner>,
    pub clock: Arc<dyn Clock>,
    /// Suppress duplicate admissions by fingerprint.
    pub queue_dedup: bool,
}

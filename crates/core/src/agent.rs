// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator worker identity.

use serde::{Deserialize, Serialize};

/// A worker registered with the orchestrator.
///
/// Runs are matched to workers by label set; the dispatcher caches the
/// worker roster once at startup and steers submissions toward idle ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

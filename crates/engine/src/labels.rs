// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-label steering for new submissions.

use sluice_core::{Agent, FlowRun};
use std::collections::HashSet;

/// Pick the label set for the next submission.
///
/// Walks the cached roster in order and returns the labels of the first
/// worker with no active run assigned to it. When every worker is busy the
/// empty set is returned, which leaves the placement to the orchestrator.
pub fn select_labels(agents: &[Agent], active: &[FlowRun]) -> Vec<String> {
    let busy: HashSet<&str> = active
        .iter()
        .filter_map(|run| run.agent.as_ref())
        .map(|agent| agent.id.as_str())
        .collect();

    agents
        .iter()
        .find(|agent| !busy.contains(agent.id.as_str()))
        .map(|agent| agent.labels.clone())
        .unwrap_or_default()
}

/// Parse a caller-supplied `labels` query value.
///
/// Blank input and blank elements are dropped, so an empty or
/// whitespace-only string means "no override" rather than a single empty
/// label.
pub fn parse_label_override(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator flow-run types.

use crate::agent::Agent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a flow run as reported by the orchestrator.
///
/// `Submitted`, `Scheduled` and `Running` count against the parallelism
/// ceiling; `Success`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Submitted,
    Scheduled,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl RunState {
    /// True once the orchestrator will never change the state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Success | RunState::Failed | RunState::Cancelled
        )
    }

    /// True while the run occupies orchestrator capacity.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunState::Submitted | RunState::Scheduled | RunState::Running
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Submitted => write!(f, "Submitted"),
            RunState::Scheduled => write!(f, "Scheduled"),
            RunState::Running => write!(f, "Running"),
            RunState::Success => write!(f, "Success"),
            RunState::Failed => write!(f, "Failed"),
            RunState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// The flow a run belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRef {
    pub name: String,
    pub version_group_id: String,
}

/// A single flow run reported by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRun {
    pub id: String,
    pub state: RunState,
    /// Worker the run is assigned to, once the orchestrator has picked one.
    #[serde(default)]
    pub agent: Option<Agent>,
    pub flow: FlowRef,
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;

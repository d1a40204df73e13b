// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator query/mutation surface used by the dispatcher.

use crate::AdapterError;
use async_trait::async_trait;
use sluice_core::{Agent, FlowRun};

/// Inputs for creating one orchestrator run.
#[derive(Debug, Clone)]
pub struct CreateRun<'a> {
    pub version_group_id: &'a str,
    pub run_name: &'a str,
    /// Worker labels to pin the run to; empty lets the orchestrator choose.
    pub labels: &'a [String],
    /// Orchestrator-side idempotency key; `None` disables the check.
    pub idempotency_key: Option<String>,
    /// Run parameters as a JSON document.
    pub parameters_json: &'a str,
}

/// Typed view of the orchestrator.
#[async_trait]
pub trait FlowApi: Send + Sync {
    /// Runs in Submitted/Scheduled/Running for the named flow and project.
    async fn active_runs_for_flow(
        &self,
        flow_name: &str,
        project_name: &str,
    ) -> Result<Vec<FlowRun>, AdapterError>;

    /// Runs matching the given ids, scoped to the named flow and project.
    async fn runs_by_id(
        &self,
        ids: &[String],
        flow_name: &str,
        project_name: &str,
    ) -> Result<Vec<FlowRun>, AdapterError>;

    /// All workers except those carrying `ignore_label`.
    async fn list_agents(&self, ignore_label: &str) -> Result<Vec<Agent>, AdapterError>;

    /// Version group required to create a run of the named flow.
    async fn version_group_for(
        &self,
        flow_name: &str,
        project_name: &str,
    ) -> Result<String, AdapterError>;

    /// Stored parameters of a past run, for resubmission.
    async fn run_parameters(&self, run_id: &str) -> Result<serde_json::Value, AdapterError>;

    /// Create a run and return the orchestrator-assigned id.
    async fn create_run(&self, run: CreateRun<'_>) -> Result<String, AdapterError>;
}

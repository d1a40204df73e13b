// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory orchestrator and reporter for testing.

use crate::flow_api::{CreateRun, FlowApi};
use crate::reporter::{OutcomeNote, Reporter, RuntimeNote};
use crate::AdapterError;
use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_core::{Agent, FlowRef, FlowRun, RunState};
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded `create_run` call.
#[derive(Debug, Clone)]
pub struct CreateRunCall {
    pub run_name: String,
    pub labels: Vec<String>,
    pub idempotency_key: Option<String>,
    pub parameters_json: String,
}

#[derive(Default)]
struct FakeFlowState {
    runs: Vec<FlowRun>,
    agents: Vec<Agent>,
    version_group_id: String,
    parameters: HashMap<String, serde_json::Value>,
    created: Vec<CreateRunCall>,
    next_run: u64,
    fail_queries: bool,
    fail_create: bool,
}

/// Fake orchestrator for testing.
///
/// Runs are seeded and mutated by the test; `create_run` appends a new run
/// in `Submitted` state and returns its id.
#[derive(Clone, Default)]
pub struct FakeFlowApi {
    inner: Arc<Mutex<FakeFlowState>>,
}

impl FakeFlowApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_agents(&self, agents: Vec<Agent>) {
        self.inner.lock().agents = agents;
    }

    pub fn set_version_group(&self, id: impl Into<String>) {
        self.inner.lock().version_group_id = id.into();
    }

    pub fn set_parameters(&self, run_id: impl Into<String>, parameters: serde_json::Value) {
        self.inner.lock().parameters.insert(run_id.into(), parameters);
    }

    /// Seed an active run, optionally pinned to an agent.
    pub fn add_run(&self, id: &str, state: RunState, agent: Option<Agent>) {
        let mut inner = self.inner.lock();
        let version_group_id = inner.version_group_id.clone();
        inner.runs.push(FlowRun {
            id: id.to_string(),
            state,
            agent,
            flow: FlowRef {
                name: "fake-flow".to_string(),
                version_group_id,
            },
        });
    }

    /// Move an existing run to a new state.
    pub fn set_run_state(&self, id: &str, state: RunState) {
        let mut inner = self.inner.lock();
        if let Some(run) = inner.runs.iter_mut().find(|r| r.id == id) {
            run.state = state;
        }
    }

    /// Make every query fail until reset.
    pub fn fail_queries(&self, fail: bool) {
        self.inner.lock().fail_queries = fail;
    }

    /// Make `create_run` fail until reset.
    pub fn fail_create(&self, fail: bool) {
        self.inner.lock().fail_create = fail;
    }

    pub fn created(&self) -> Vec<CreateRunCall> {
        self.inner.lock().created.clone()
    }
}

#[async_trait]
impl FlowApi for FakeFlowApi {
    async fn active_runs_for_flow(
        &self,
        _flow_name: &str,
        _project_name: &str,
    ) -> Result<Vec<FlowRun>, AdapterError> {
        let inner = self.inner.lock();
        if inner.fail_queries {
            return Err(AdapterError::Api("fake query failure".to_string()));
        }
        Ok(inner
            .runs
            .iter()
            .filter(|r| r.state.is_active())
            .cloned()
            .collect())
    }

    async fn runs_by_id(
        &self,
        ids: &[String],
        _flow_name: &str,
        _project_name: &str,
    ) -> Result<Vec<FlowRun>, AdapterError> {
        let inner = self.inner.lock();
        if inner.fail_queries {
            return Err(AdapterError::Api("fake query failure".to_string()));
        }
        Ok(inner
            .runs
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn list_agents(&self, ignore_label: &str) -> Result<Vec<Agent>, AdapterError> {
        let inner = self.inner.lock();
        if inner.fail_queries {
            return Err(AdapterError::Api("fake query failure".to_string()));
        }
        Ok(inner
            .agents
            .iter()
            .filter(|a| !a.labels.iter().any(|l| l == ignore_label))
            .cloned()
            .collect())
    }

    async fn version_group_for(
        &self,
        flow_name: &str,
        project_name: &str,
    ) -> Result<String, AdapterError> {
        let inner = self.inner.lock();
        if inner.version_group_id.is_empty() {
            return Err(AdapterError::FlowNotFound {
                flow_name: flow_name.to_string(),
                project_name: project_name.to_string(),
            });
        }
        Ok(inner.version_group_id.clone())
    }

    async fn run_parameters(&self, run_id: &str) -> Result<serde_json::Value, AdapterError> {
        let inner = self.inner.lock();
        inner
            .parameters
            .get(run_id)
            .cloned()
            .ok_or_else(|| AdapterError::RunNotFound(run_id.to_string()))
    }

    async fn create_run(&self, run: CreateRun<'_>) -> Result<String, AdapterError> {
        let mut inner = self.inner.lock();
        if inner.fail_create {
            return Err(AdapterError::Api("fake create failure".to_string()));
        }
        inner.created.push(CreateRunCall {
            run_name: run.run_name.to_string(),
            labels: run.labels.to_vec(),
            idempotency_key: run.idempotency_key.clone(),
            parameters_json: run.parameters_json.to_string(),
        });
        inner.next_run += 1;
        let id = format!("run-{}", inner.next_run);
        let version_group_id = inner.version_group_id.clone();
        inner.runs.push(FlowRun {
            id: id.clone(),
            state: RunState::Submitted,
            agent: None,
            flow: FlowRef {
                name: "fake-flow".to_string(),
                version_group_id,
            },
        });
        Ok(id)
    }
}

/// Recorded reporter notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportCall {
    QueueRuntime(RuntimeNote),
    Succeeded(OutcomeNote),
    Failed(OutcomeNote),
}

#[derive(Default)]
struct FakeReporterState {
    calls: Vec<ReportCall>,
    fail_succeeded: bool,
}

/// Fake reporter recording every notification.
#[derive(Clone, Default)]
pub struct FakeReporter {
    inner: Arc<Mutex<FakeReporterState>>,
}

impl FakeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make succeeded notifications fail, to exercise the failed fallback.
    pub fn fail_succeeded(&self, fail: bool) {
        self.inner.lock().fail_succeeded = fail;
    }

    pub fn calls(&self) -> Vec<ReportCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl Reporter for FakeReporter {
    async fn queue_runtime(&self, note: &RuntimeNote) -> Result<(), AdapterError> {
        self.inner
            .lock()
            .calls
            .push(ReportCall::QueueRuntime(note.clone()));
        Ok(())
    }

    async fn processing_succeeded(&self, note: &OutcomeNote) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock();
        if inner.fail_succeeded {
            return Err(AdapterError::Status {
                status: 500,
                body: "fake failure".to_string(),
            });
        }
        inner.calls.push(ReportCall::Succeeded(note.clone()));
        Ok(())
    }

    async fn processing_failed(&self, note: &OutcomeNote) -> Result<(), AdapterError> {
        self.inner
            .lock()
            .calls
            .push(ReportCall::Failed(note.clone()));
        Ok(())
    }
}

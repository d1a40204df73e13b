// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GraphQL client for the workflow orchestrator.
//!
//! Queries and mutations are issued as plain POSTs against the
//! orchestrator's GraphQL endpoint. All calls share one HTTP client and
//! therefore one process-wide timeout.

use crate::flow_api::{CreateRun, FlowApi};
use crate::AdapterError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sluice_core::{Agent, FlowRun};
use std::time::Duration;
use tracing::debug;

const ACTIVE_RUNS_QUERY: &str = r#"
query($flowName: String, $projectName: String) {
  flow_run(where: {
    _and: [
      { _or: [
        { state: { _eq: "Submitted" } }
        { state: { _eq: "Scheduled" } }
        { state: { _eq: "Running" } }
      ] }
      { flow: { name: { _eq: $flowName }, project: { name: { _eq: $projectName } } } }
    ]
  }) {
    id
    state
    agent { id name labels }
    flow { name version_group_id }
  }
}"#;

const RUNS_BY_ID_QUERY: &str = r#"
query($ids: [uuid!], $flowName: String, $projectName: String) {
  flow_run(where: {
    _and: [
      { id: { _in: $ids } }
      { flow: { name: { _eq: $flowName }, project: { name: { _eq: $projectName } } } }
    ]
  }) {
    id
    state
    agent { id name labels }
    flow { name version_group_id }
  }
}"#;

const AGENTS_QUERY: &str = r#"
query($ignore: jsonb) {
  agent(where: { _not: { labels: { _contains: $ignore } } }) {
    id
    name
    labels
  }
}"#;

const VERSION_GROUP_QUERY: &str = r#"
query($flowName: String, $projectName: String) {
  flow(where: {
    name: { _eq: $flowName }
    archived: { _eq: false }
    project: { name: { _eq: $projectName } }
  }, order_by: { version: desc }, limit: 1) {
    version_group_id
  }
}"#;

const RUN_PARAMETERS_QUERY: &str = r#"
query($id: uuid) {
  flow_run(where: { id: { _eq: $id } }) {
    parameters
  }
}"#;

/// Orchestrator client speaking GraphQL over HTTP.
pub struct GraphqlFlowClient {
    endpoint: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct FlowRunsData {
    flow_run: Vec<FlowRun>,
}

#[derive(Deserialize)]
struct AgentsData {
    agent: Vec<Agent>,
}

#[derive(Deserialize)]
struct FlowsData {
    flow: Vec<FlowVersion>,
}

#[derive(Deserialize)]
struct FlowVersion {
    version_group_id: String,
}

#[derive(Deserialize)]
struct RunParametersData {
    flow_run: Vec<StoredParameters>,
}

#[derive(Deserialize)]
struct StoredParameters {
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct CreateRunData {
    create_flow_run: CreatedRun,
}

#[derive(Deserialize)]
struct CreatedRun {
    id: String,
}

impl GraphqlFlowClient {
    /// Build a client against `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AdapterError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    async fn run<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, AdapterError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: Envelope = response.json().await?;
        if !envelope.errors.is_empty() {
            let messages: Vec<String> =
                envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(AdapterError::Api(messages.join("; ")));
        }
        let data = envelope
            .data
            .ok_or_else(|| AdapterError::Decode("response carried no data".to_string()))?;
        serde_json::from_value(data).map_err(|e| AdapterError::Decode(e.to_string()))
    }
}

/// Compact a parameters document and escape it for embedding inside the
/// mutation literal.
///
/// The orchestrator's parser rejects the parameters field when it arrives
/// as a GraphQL variable, so the JSON has to be inlined as an escaped
/// string with all formatting whitespace removed. This is a workaround for
/// a server-side defect; do not switch it back to a variable.
pub(crate) fn inline_parameters(parameters_json: &str) -> Result<String, AdapterError> {
    let value: serde_json::Value = serde_json::from_str(parameters_json)
        .map_err(|e| AdapterError::Parameters(e.to_string()))?;
    let compact =
        serde_json::to_string(&value).map_err(|e| AdapterError::Parameters(e.to_string()))?;
    Ok(compact.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait]
impl FlowApi for GraphqlFlowClient {
    async fn active_runs_for_flow(
        &self,
        flow_name: &str,
        project_name: &str,
    ) -> Result<Vec<FlowRun>, AdapterError> {
        let data: FlowRunsData = self
            .run(
                ACTIVE_RUNS_QUERY,
                json!({ "flowName": flow_name, "projectName": project_name }),
            )
            .await?;
        Ok(data.flow_run)
    }

    async fn runs_by_id(
        &self,
        ids: &[String],
        flow_name: &str,
        project_name: &str,
    ) -> Result<Vec<FlowRun>, AdapterError> {
        let data: FlowRunsData = self
            .run(
                RUNS_BY_ID_QUERY,
                json!({ "ids": ids, "flowName": flow_name, "projectName": project_name }),
            )
            .await?;
        Ok(data.flow_run)
    }

    async fn list_agents(&self, ignore_label: &str) -> Result<Vec<Agent>, AdapterError> {
        let data: AgentsData = self
            .run(AGENTS_QUERY, json!({ "ignore": [ignore_label] }))
            .await?;
        Ok(data.agent)
    }

    async fn version_group_for(
        &self,
        flow_name: &str,
        project_name: &str,
    ) -> Result<String, AdapterError> {
        let data: FlowsData = self
            .run(
                VERSION_GROUP_QUERY,
                json!({ "flowName": flow_name, "projectName": project_name }),
            )
            .await?;
        data.flow
            .into_iter()
            .next()
            .map(|f| f.version_group_id)
            .ok_or_else(|| AdapterError::FlowNotFound {
                flow_name: flow_name.to_string(),
                project_name: project_name.to_string(),
            })
    }

    async fn run_parameters(&self, run_id: &str) -> Result<serde_json::Value, AdapterError> {
        let data: RunParametersData = self
            .run(RUN_PARAMETERS_QUERY, json!({ "id": run_id }))
            .await?;
        data.flow_run
            .into_iter()
            .next()
            .map(|r| r.parameters)
            .ok_or_else(|| AdapterError::RunNotFound(run_id.to_string()))
    }

    async fn create_run(&self, run: CreateRun<'_>) -> Result<String, AdapterError> {
        let escaped = inline_parameters(run.parameters_json)?;

        // The parameters field is inlined into the document (see
        // `inline_parameters`); everything else travels as variables.
        let mutation = format!(
            "mutation($id: String, $runName: String, $key: String, $labels: [String!]) {{\
             create_flow_run(input: {{ \
             idempotency_key: $key, \
             version_group_id: $id, \
             flow_run_name: $runName, \
             labels: $labels, \
             parameters: \"{escaped}\" \
             }}) {{ id }}}}"
        );

        let labels = if run.labels.is_empty() {
            serde_json::Value::Null
        } else {
            json!(run.labels)
        };

        debug!(run_name = run.run_name, "creating orchestrator run");
        let data: CreateRunData = self
            .run(
                &mutation,
                json!({
                    "id": run.version_group_id,
                    "runName": run.run_name,
                    "key": run.idempotency_key,
                    "labels": labels,
                }),
            )
            .await?;
        Ok(data.create_flow_run.id)
    }
}

#[cfg(test)]
#[path = "graphql_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors from the orchestrator and reporter clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Network failure or timeout before a response arrived.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered outside the 2xx range.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The orchestrator accepted the request but returned errors.
    #[error("orchestrator error: {0}")]
    Api(String),

    /// The response decoded but did not carry the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// No flow matches the configured name and project.
    #[error("no flow named {flow_name:?} in project {project_name:?}")]
    FlowNotFound {
        flow_name: String,
        project_name: String,
    },

    /// The orchestrator has no run with the requested id.
    #[error("run {0} not found")]
    RunNotFound(String),

    /// Run parameters could not be prepared for submission.
    #[error("invalid run parameters: {0}")]
    Parameters(String),
}

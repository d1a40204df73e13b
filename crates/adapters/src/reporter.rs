// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome reporting to the external pipeline-reporting endpoint.
//!
//! Three notifications, all `PUT` JSON with basic auth: queue-runtime at
//! the instant of dispatch, processing-succeeded and processing-failed at
//! terminal states. Delivery is best-effort; a failure is the caller's to
//! log, never to retry here.

use crate::AdapterError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Queue residency report emitted when a request leaves the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeNote {
    pub run_id: String,
    pub data_id: String,
    pub doc_ids: Vec<String>,
    pub is_indicator: bool,
    /// Admission wall-clock, ms since epoch.
    pub start_time: u64,
    /// Dispatch wall-clock, ms since epoch.
    pub end_time: u64,
}

/// Terminal-outcome report for a dispatched run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeNote {
    /// Orchestrator-assigned run id.
    pub flow_id: String,
    pub run_id: String,
    pub data_id: String,
    pub doc_ids: Vec<String>,
    pub is_indicator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
}

/// Sink for dispatch and outcome notifications.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn queue_runtime(&self, note: &RuntimeNote) -> Result<(), AdapterError>;
    async fn processing_succeeded(&self, note: &OutcomeNote) -> Result<(), AdapterError>;
    async fn processing_failed(&self, note: &OutcomeNote) -> Result<(), AdapterError>;
}

/// Reporter that PUTs JSON to the reporting endpoint with basic auth.
pub struct HttpReporter {
    base: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl HttpReporter {
    pub fn new(
        base: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdapterError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base: base.into(),
            username: username.into(),
            password: password.into(),
            http,
        })
    }

    async fn put<T: Serialize>(&self, path: &str, payload: &T) -> Result<(), AdapterError> {
        let url = format!("{}/pipeline-reporting/{}", self.base, path);
        debug!(url = %url, "sending pipeline report");
        let response = self
            .http
            .put(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Reporter for HttpReporter {
    async fn queue_runtime(&self, note: &RuntimeNote) -> Result<(), AdapterError> {
        self.put("queue-runtime", note).await
    }

    async fn processing_succeeded(&self, note: &OutcomeNote) -> Result<(), AdapterError> {
        self.put("processing-succeeded", note).await
    }

    async fn processing_failed(&self, note: &OutcomeNote) -> Result<(), AdapterError> {
        self.put("processing-failed", note).await
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP request handlers for the control surface.
//!
//! Each handler maps one external operation onto the queue or dispatcher.
//! Validation failures return 400 and never reach the queue; a full queue
//! returns 503; a suppressed duplicate reads as success so a repeated PUT
//! observes the same outcome as the first.

use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use sluice_adapters::AdapterError;
use sluice_core::{EnqueueRequest, KeyedRequest};
use sluice_engine::{admit, parse_label_override, EngineError};
use tracing::error;

/// Body of `GET /data-pipeline/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Requests waiting in the queue.
    pub count: usize,
    /// Whether the dispatch loop is running.
    pub is_running: bool,
    /// Active orchestrator runs for our flow, freshly fetched.
    pub running: usize,
}

/// Body of `GET /data-pipeline/waiting`.
#[derive(Debug, Serialize)]
pub struct WaitingResponse {
    pub count: usize,
}

/// Queue entry projected to the job-description shape.
#[derive(Debug, Serialize)]
pub struct JobView {
    pub model_id: String,
    pub run_id: String,
    pub data_paths: Vec<String>,
    pub doc_ids: Vec<String>,
    pub is_indicator: bool,
}

impl From<KeyedRequest> for JobView {
    fn from(keyed: KeyedRequest) -> Self {
        Self {
            model_id: keyed.request.model_id,
            run_id: keyed.request.run_id,
            data_paths: keyed.request.data_paths,
            doc_ids: keyed.request.doc_ids,
            is_indicator: keyed.request.is_indicator,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LabelsQuery {
    #[serde(default)]
    labels: Option<String>,
}

fn engine_error_response(err: EngineError) -> Response {
    let status = match &err {
        EngineError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::FlowNotDone(_) | EngineError::Request(_) => StatusCode::BAD_REQUEST,
        EngineError::Adapter(AdapterError::RunNotFound(_)) => StatusCode::BAD_REQUEST,
        EngineError::Adapter(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Queue(sluice_queue::QueueError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (status, err.to_string()).into_response()
}

/// `PUT /data-pipeline/enqueue`
pub async fn enqueue(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match EnqueueRequest::parse(&body) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    match admit(
        state.queue.as_ref(),
        request,
        Vec::new(),
        state.queue_dedup,
        state.clock.as_ref(),
    ) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// `PUT /data-pipeline/bulk-enqueue`
///
/// Admits each element in order, stopping at the first failure. Elements
/// admitted before the failure stay admitted.
pub async fn bulk_enqueue(State(state): State<AppState>, body: Bytes) -> Response {
    let bodies: Vec<serde_json::Value> = match serde_json::from_slice(&body) {
        Ok(bodies) => bodies,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("invalid request body: {e}"),
            )
                .into_response()
        }
    };

    for entry in bodies {
        let raw = entry.to_string();
        let request = match EnqueueRequest::parse(raw.as_bytes()) {
            Ok(request) => request,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        if let Err(e) = admit(
            state.queue.as_ref(),
            request,
            Vec::new(),
            state.queue_dedup,
            state.clock.as_ref(),
        ) {
            return engine_error_response(e);
        }
    }
    StatusCode::OK.into_response()
}

/// `GET /data-pipeline/status`
pub async fn status(State(state): State<AppState>) -> Response {
    let running = match state.runner.active_count().await {
        Ok(count) => count,
        Err(e) => return engine_error_response(e),
    };
    Json(StatusResponse {
        count: state.queue.size(),
        is_running: state.runner.is_running(),
        running,
    })
    .into_response()
}

/// `GET /data-pipeline/waiting`
pub async fn waiting(State(state): State<AppState>) -> Json<WaitingResponse> {
    Json(WaitingResponse {
        count: state.queue.size(),
    })
}

/// `GET /data-pipeline/jobs`
pub async fn jobs(State(state): State<AppState>) -> Response {
    match state.queue.snapshot() {
        Ok(items) => {
            let views: Vec<JobView> = items.into_iter().map(JobView::from).collect();
            Json(views).into_response()
        }
        Err(e) => engine_error_response(EngineError::Queue(e)),
    }
}

/// `PUT /data-pipeline/start`
pub async fn start(State(state): State<AppState>) -> StatusCode {
    state.runner.start();
    StatusCode::OK
}

/// `PUT /data-pipeline/stop`
pub async fn stop(State(state): State<AppState>) -> StatusCode {
    state.runner.stop();
    StatusCode::OK
}

/// `PUT /data-pipeline/clear`
pub async fn clear(State(state): State<AppState>) -> Response {
    match state.queue.clear() {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => engine_error_response(EngineError::Queue(e)),
    }
}

/// `PUT /data-pipeline/force-flow?labels=a,b,c`
pub async fn force_flow(
    State(state): State<AppState>,
    Query(params): Query<LabelsQuery>,
) -> Response {
    let labels = parse_label_override(params.labels.as_deref().unwrap_or_default());
    match state.runner.force_submit(labels).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// `PUT /data-pipeline/retry-flow/{run_id}?labels=...` with optional patch
/// body.
pub async fn retry_flow(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(params): Query<LabelsQuery>,
    body: Bytes,
) -> Response {
    let labels = parse_label_override(params.labels.as_deref().unwrap_or_default());
    let patch = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(patch) => Some(patch),
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    format!("invalid request body: {e}"),
                )
                    .into_response()
            }
        }
    };

    match state.runner.retry(&run_id, patch, labels).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job request envelope and the keyed form held in the queue.
//!
//! An [`EnqueueRequest`] is the validated view of an incoming job body.
//! Only the recognized fields are validated; the original body is retained
//! verbatim in `raw` so that unrecognized fields pass through to the
//! orchestrator untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation and decoding failures for incoming job bodies.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("model_id missing")]
    MissingModelId,
    #[error("run_id missing")]
    MissingRunId,
    #[error("data_paths missing")]
    MissingDataPaths,
    #[error("invalid request body: {0}")]
    Malformed(String),
}

/// A data-pipeline job description supplied by an upstream caller.
///
/// `raw` holds the original request body; it is the unit the fingerprint is
/// computed over and the exact bytes forwarded as run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub model_id: String,
    pub run_id: String,
    pub data_paths: Vec<String>,
    #[serde(default)]
    pub doc_ids: Vec<String>,
    #[serde(default)]
    pub is_indicator: bool,
    /// Original request body, forwarded verbatim.
    pub raw: String,
}

/// Recognized fields of an incoming body. Everything else stays in the raw
/// bytes only.
#[derive(Deserialize)]
struct RecognizedFields {
    #[serde(default)]
    model_id: String,
    #[serde(default)]
    run_id: String,
    #[serde(default)]
    data_paths: Vec<String>,
    #[serde(default)]
    doc_ids: Vec<String>,
    #[serde(default)]
    is_indicator: bool,
}

impl EnqueueRequest {
    /// Decode and validate a raw request body.
    pub fn parse(raw: &[u8]) -> Result<Self, RequestError> {
        let fields: RecognizedFields =
            serde_json::from_slice(raw).map_err(|e| RequestError::Malformed(e.to_string()))?;
        let raw = String::from_utf8(raw.to_vec())
            .map_err(|e| RequestError::Malformed(e.to_string()))?;

        let request = Self {
            model_id: fields.model_id,
            run_id: fields.run_id,
            data_paths: fields.data_paths,
            doc_ids: fields.doc_ids,
            is_indicator: fields.is_indicator,
            raw,
        };
        request.validate()?;
        Ok(request)
    }

    /// Check the minimum field set required to run a job.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.model_id.is_empty() {
            return Err(RequestError::MissingModelId);
        }
        if self.run_id.is_empty() {
            return Err(RequestError::MissingRunId);
        }
        if self.data_paths.is_empty() || self.data_paths.iter().any(|p| p.is_empty()) {
            return Err(RequestError::MissingDataPaths);
        }
        Ok(())
    }

    /// Run name used when creating an orchestrator run.
    pub fn run_name(&self) -> String {
        format!("{}:{}", self.model_id, self.run_id)
    }
}

/// An admitted request: the envelope plus the dedup fingerprint, admission
/// time, and an optional worker-label override.
///
/// Once enqueued, the request, its raw bytes, and its key never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedRequest {
    pub request: EnqueueRequest,
    /// Fingerprint of the raw bytes; `0` means "no dedup".
    pub request_key: i32,
    /// Wall clock at admission, milliseconds since epoch.
    pub enqueue_time_ms: u64,
    /// Worker labels forced by the caller; empty means the dispatcher picks.
    #[serde(default)]
    pub label_override: Vec<String>,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

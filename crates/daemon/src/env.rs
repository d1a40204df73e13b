// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.
//!
//! Every setting has a default; variables carry the `SLUICE_` prefix.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Which duplicate-suppression layers are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdempotencyMode {
    /// Queue dedup and orchestrator keys.
    All,
    /// No duplicate suppression anywhere.
    None,
    /// Queue dedup only.
    Queue,
    /// Orchestrator keys only.
    Orchestrator,
}

impl IdempotencyMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "none" => Some(Self::None),
            "queue" => Some(Self::Queue),
            "prefect" => Some(Self::Orchestrator),
            _ => None,
        }
    }

    /// Suppress duplicate admissions at the queue.
    pub fn use_queue(&self) -> bool {
        matches!(self, Self::All | Self::Queue)
    }

    /// Hand the fingerprint to the orchestrator as an idempotency key.
    pub fn use_orchestrator(&self) -> bool {
        matches!(self, Self::All | Self::Orchestrator)
    }
}

/// Imported environment settings.
#[derive(Debug, Clone)]
pub struct Environment {
    /// `dev` or `prod` logging profile.
    pub mode: String,
    /// HTTP listen endpoint, `:port` or `host:port`.
    pub addr: String,
    /// Orchestrator endpoint.
    pub data_pipeline_addr: String,
    pub data_pipeline_timeout_sec: u64,
    pub data_pipeline_queue_size: usize,
    pub data_pipeline_poll_interval_sec: u64,
    pub data_pipeline_project_name: String,
    pub data_pipeline_flow_name: String,
    pub data_pipeline_idempotency_checks: IdempotencyMode,
    pub data_pipeline_parallelism: usize,
    /// Persisted queue on disk, or memory only.
    pub data_pipeline_persisted_queue: bool,
    pub data_pipeline_queue_dir: PathBuf,
    pub data_pipeline_queue_name: String,
    /// Daily dispatcher pause, RFC3339. A value already in the past
    /// disables the trigger.
    pub pause_time: Option<DateTime<Utc>>,
    /// Daily dispatcher resume, RFC3339.
    pub resume_time: Option<DateTime<Utc>>,
    /// Reporting endpoint and credentials.
    pub causemos_addr: String,
    pub causemos_username: String,
    pub causemos_password: String,
    /// Workers carrying this label are excluded from the roster.
    pub agent_label_to_ignore: String,
}

impl Environment {
    /// Import settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Import settings through a lookup function (tests inject one).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            mode: get("SLUICE_MODE", "dev"),
            addr: get("SLUICE_ADDR", ":4040"),
            data_pipeline_addr: get("SLUICE_DATA_PIPELINE_ADDR", "http://localhost:4200"),
            data_pipeline_timeout_sec: parse(&lookup, "SLUICE_DATA_PIPELINE_TIMEOUT_SEC", 10)?,
            data_pipeline_queue_size: parse(&lookup, "SLUICE_DATA_PIPELINE_QUEUE_SIZE", 100)?,
            data_pipeline_poll_interval_sec: parse(
                &lookup,
                "SLUICE_DATA_PIPELINE_POLL_INTERVAL_SEC",
                5,
            )?,
            data_pipeline_project_name: get("SLUICE_DATA_PIPELINE_PROJECT_NAME", "Development"),
            data_pipeline_flow_name: get("SLUICE_DATA_PIPELINE_FLOW_NAME", "Data Pipeline"),
            data_pipeline_idempotency_checks: parse_mode(&lookup)?,
            data_pipeline_parallelism: parse(&lookup, "SLUICE_DATA_PIPELINE_PARALLELISM", 1)?,
            data_pipeline_persisted_queue: parse(
                &lookup,
                "SLUICE_DATA_PIPELINE_PERSISTED_QUEUE",
                true,
            )?,
            data_pipeline_queue_dir: PathBuf::from(get("SLUICE_DATA_PIPELINE_QUEUE_DIR", "./")),
            data_pipeline_queue_name: get("SLUICE_DATA_PIPELINE_QUEUE_NAME", "request_queue"),
            pause_time: parse_time(&lookup, "SLUICE_PAUSE_TIME")?,
            resume_time: parse_time(&lookup, "SLUICE_RESUME_TIME")?,
            causemos_addr: get("SLUICE_CAUSEMOS_ADDR", ""),
            causemos_username: get("SLUICE_CAUSEMOS_USERNAME", ""),
            causemos_password: get("SLUICE_CAUSEMOS_PASSWORD", ""),
            agent_label_to_ignore: get("SLUICE_AGENT_LABEL_TO_IGNORE", "non-dask"),
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_mode(lookup: &impl Fn(&str) -> Option<String>) -> Result<IdempotencyMode, ConfigError> {
    let key = "SLUICE_DATA_PIPELINE_IDEMPOTENCY_CHECKS";
    match lookup(key) {
        Some(raw) => IdempotencyMode::parse(&raw).ok_or_else(|| ConfigError::Invalid {
            key: key.to_string(),
            message: format!("unknown mode {raw:?}, expected all|none|queue|prefect"),
        }),
        None => Ok(IdempotencyMode::All),
    }
}

fn parse_time(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<DateTime<Utc>>, ConfigError> {
    match lookup(key) {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

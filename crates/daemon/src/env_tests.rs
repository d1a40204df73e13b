// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

fn load(vars: &[(&str, &str)]) -> Result<Environment, ConfigError> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Environment::from_lookup(|key| map.get(key).cloned())
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let env = load(&[]).unwrap();
    assert_eq!(env.mode, "dev");
    assert_eq!(env.addr, ":4040");
    assert_eq!(env.data_pipeline_addr, "http://localhost:4200");
    assert_eq!(env.data_pipeline_timeout_sec, 10);
    assert_eq!(env.data_pipeline_queue_size, 100);
    assert_eq!(env.data_pipeline_poll_interval_sec, 5);
    assert_eq!(env.data_pipeline_project_name, "Development");
    assert_eq!(env.data_pipeline_flow_name, "Data Pipeline");
    assert_eq!(env.data_pipeline_idempotency_checks, IdempotencyMode::All);
    assert_eq!(env.data_pipeline_parallelism, 1);
    assert!(env.data_pipeline_persisted_queue);
    assert_eq!(env.data_pipeline_queue_name, "request_queue");
    assert!(env.pause_time.is_none());
    assert!(env.resume_time.is_none());
    assert_eq!(env.agent_label_to_ignore, "non-dask");
}

#[test]
fn explicit_values_override_defaults() {
    let env = load(&[
        ("SLUICE_MODE", "prod"),
        ("SLUICE_DATA_PIPELINE_QUEUE_SIZE", "7"),
        ("SLUICE_DATA_PIPELINE_PARALLELISM", "3"),
        ("SLUICE_DATA_PIPELINE_PERSISTED_QUEUE", "false"),
        ("SLUICE_CAUSEMOS_ADDR", "http://reports:9000"),
    ])
    .unwrap();
    assert_eq!(env.mode, "prod");
    assert_eq!(env.data_pipeline_queue_size, 7);
    assert_eq!(env.data_pipeline_parallelism, 3);
    assert!(!env.data_pipeline_persisted_queue);
    assert_eq!(env.causemos_addr, "http://reports:9000");
}

#[test]
fn bad_number_is_rejected() {
    let err = load(&[("SLUICE_DATA_PIPELINE_QUEUE_SIZE", "lots")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

#[test]
fn idempotency_modes_parse() {
    for (raw, queue, orchestrator) in [
        ("all", true, true),
        ("none", false, false),
        ("queue", true, false),
        ("prefect", false, true),
    ] {
        let env = load(&[("SLUICE_DATA_PIPELINE_IDEMPOTENCY_CHECKS", raw)]).unwrap();
        assert_eq!(env.data_pipeline_idempotency_checks.use_queue(), queue);
        assert_eq!(
            env.data_pipeline_idempotency_checks.use_orchestrator(),
            orchestrator
        );
    }
}

#[test]
fn unknown_idempotency_mode_is_rejected() {
    let err = load(&[("SLUICE_DATA_PIPELINE_IDEMPOTENCY_CHECKS", "maybe")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

#[test]
fn pause_time_parses_rfc3339() {
    let env = load(&[("SLUICE_PAUSE_TIME", "2099-01-02T03:04:05Z")]).unwrap();
    let pause = env.pause_time.unwrap();
    assert_eq!(pause.to_rfc3339(), "2099-01-02T03:04:05+00:00");
}

#[test]
fn invalid_pause_time_is_rejected() {
    let err = load(&[("SLUICE_PAUSE_TIME", "tomorrow-ish")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

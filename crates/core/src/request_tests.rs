// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn body(model: &str, run: &str, paths: &[&str]) -> Vec<u8> {
    serde_json::json!({
        "model_id": model,
        "run_id": run,
        "data_paths": paths,
    })
    .to_string()
    .into_bytes()
}

#[test]
fn parse_minimal_body() {
    let raw = body("geo-model", "run-1", &["/data/a.parquet"]);
    let req = EnqueueRequest::parse(&raw).unwrap();
    assert_eq!(req.model_id, "geo-model");
    assert_eq!(req.run_id, "run-1");
    assert_eq!(req.data_paths, vec!["/data/a.parquet"]);
    assert!(req.doc_ids.is_empty());
    assert!(!req.is_indicator);
    assert_eq!(req.raw.as_bytes(), &raw[..]);
}

#[test]
fn parse_preserves_unknown_fields_in_raw() {
    let raw = br#"{"model_id":"m","run_id":"r","data_paths":["/a"],"resolution":"month"}"#;
    let req = EnqueueRequest::parse(raw).unwrap();
    assert!(req.raw.contains("resolution"));
}

#[test]
fn parse_rejects_missing_model_id() {
    let raw = br#"{"run_id":"r","data_paths":["/a"]}"#;
    let err = EnqueueRequest::parse(raw).unwrap_err();
    assert!(matches!(err, RequestError::MissingModelId));
}

#[test]
fn parse_rejects_missing_run_id() {
    let raw = br#"{"model_id":"m","data_paths":["/a"]}"#;
    let err = EnqueueRequest::parse(raw).unwrap_err();
    assert!(matches!(err, RequestError::MissingRunId));
}

#[test]
fn parse_rejects_empty_data_paths() {
    let raw = br#"{"model_id":"m","run_id":"r","data_paths":[]}"#;
    let err = EnqueueRequest::parse(raw).unwrap_err();
    assert!(matches!(err, RequestError::MissingDataPaths));
}

#[test]
fn parse_rejects_blank_data_path_element() {
    let raw = br#"{"model_id":"m","run_id":"r","data_paths":["/a",""]}"#;
    let err = EnqueueRequest::parse(raw).unwrap_err();
    assert!(matches!(err, RequestError::MissingDataPaths));
}

#[test]
fn parse_rejects_non_json() {
    let err = EnqueueRequest::parse(b"not json").unwrap_err();
    assert!(matches!(err, RequestError::Malformed(_)));
}

#[test]
fn run_name_joins_model_and_run() {
    let raw = body("m", "r", &["/a"]);
    let req = EnqueueRequest::parse(&raw).unwrap();
    assert_eq!(req.run_name(), "m:r");
}

#[test]
fn keyed_request_round_trips_through_json() {
    let raw = body("m", "r", &["/a"]);
    let keyed = KeyedRequest {
        request: EnqueueRequest::parse(&raw).unwrap(),
        request_key: -42,
        enqueue_time_ms: 1_700_000_000_000,
        label_override: vec!["gpu".to_string()],
    };
    let json = serde_json::to_string(&keyed).unwrap();
    let back: KeyedRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, keyed);
}

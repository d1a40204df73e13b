// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn inline_parameters_compacts_whitespace() {
    let pretty = "{\n  \"model_id\": \"m\",\n  \"data_paths\": [\n    \"/a\"\n  ]\n}";
    let inlined = inline_parameters(pretty).unwrap();
    assert!(!inlined.contains('\n'));
    assert!(!inlined.contains("  "));
    assert_eq!(
        inlined,
        "{\\\"data_paths\\\":[\\\"/a\\\"],\\\"model_id\\\":\\\"m\\\"}"
    );
}

#[test]
fn inline_parameters_escapes_embedded_quotes_and_backslashes() {
    let raw = r#"{"note":"say \"hi\" and c:\\tmp"}"#;
    let inlined = inline_parameters(raw).unwrap();
    // Every quote and backslash must be escaped one level deeper so the
    // result can sit inside a GraphQL string literal.
    assert!(!inlined.contains("\"note\""));
    assert!(inlined.starts_with("{\\\"note\\\""));
}

#[test]
fn inline_parameters_rejects_invalid_json() {
    let err = inline_parameters("{nope").unwrap_err();
    assert!(matches!(err, AdapterError::Parameters(_)));
}

#[test]
fn graphql_error_envelope_surfaces_messages() {
    let body = r#"{"errors":[{"message":"boom"},{"message":"again"}]}"#;
    let envelope: Envelope = serde_json::from_str(body).unwrap();
    assert!(envelope.data.is_none());
    let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
    assert_eq!(messages.join("; "), "boom; again");
}

#[test]
fn flow_runs_payload_decodes() {
    let body = r#"{
        "flow_run": [
            {
                "id": "r1",
                "state": "Running",
                "agent": { "id": "a1", "name": "worker-1", "labels": ["dask"] },
                "flow": { "name": "Data Pipeline", "version_group_id": "vg" }
            }
        ]
    }"#;
    let data: FlowRunsData = serde_json::from_str(body).unwrap();
    assert_eq!(data.flow_run.len(), 1);
    assert_eq!(
        data.flow_run[0].agent.as_ref().map(|a| a.id.as_str()),
        Some("a1")
    );
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sluice_core::{FlowRef, RunState};

fn agent(id: &str, labels: &[&str]) -> Agent {
    Agent {
        id: id.to_string(),
        name: format!("worker-{id}"),
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}

fn active_run(id: &str, agent: Option<Agent>) -> FlowRun {
    FlowRun {
        id: id.to_string(),
        state: RunState::Running,
        agent,
        flow: FlowRef {
            name: "f".to_string(),
            version_group_id: "vg".to_string(),
        },
    }
}

#[test]
fn first_idle_agent_wins() {
    let agents = vec![agent("a1", &["dask", "small"]), agent("a2", &["dask", "big"])];
    let active = vec![active_run("r1", Some(agent("a1", &["dask", "small"])))];

    assert_eq!(select_labels(&agents, &active), vec!["dask", "big"]);
}

#[test]
fn no_active_runs_selects_first_agent() {
    let agents = vec![agent("a1", &["x"]), agent("a2", &["y"])];
    assert_eq!(select_labels(&agents, &[]), vec!["x"]);
}

#[test]
fn all_busy_returns_empty_set() {
    let agents = vec![agent("a1", &["x"])];
    let active = vec![active_run("r1", Some(agent("a1", &["x"])))];
    assert!(select_labels(&agents, &active).is_empty());
}

#[test]
fn unassigned_runs_do_not_mark_agents_busy() {
    let agents = vec![agent("a1", &["x"])];
    let active = vec![active_run("r1", None)];
    assert_eq!(select_labels(&agents, &active), vec!["x"]);
}

#[test]
fn empty_roster_returns_empty_set() {
    assert!(select_labels(&[], &[]).is_empty());
}

#[test]
fn override_parse_splits_and_trims() {
    assert_eq!(
        parse_label_override("a, b ,c"),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}

#[test]
fn override_parse_treats_blank_as_none() {
    assert!(parse_label_override("").is_empty());
    assert!(parse_label_override("   ").is_empty());
    assert!(parse_label_override(",,").is_empty());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sluice-adapters: clients for the workflow orchestrator and the
//! reporting endpoint.
//!
//! Both collaborators are reached through traits so the dispatcher can be
//! exercised against in-memory fakes; the production implementations speak
//! HTTP via a shared client with one process-wide timeout.

pub mod error;
pub mod flow_api;
pub mod graphql;
pub mod reporter;

pub use error::AdapterError;
pub use flow_api::{CreateRun, FlowApi};
pub use graphql::GraphqlFlowClient;
pub use reporter::{HttpReporter, OutcomeNote, Reporter, RuntimeNote};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CreateRunCall, FakeFlowApi, FakeReporter, ReportCall};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sluiced: bounded admission and dispatch daemon.
//!
//! Sits between producers of data-pipeline job requests and the workflow
//! orchestrator: buffers validated requests in a bounded (optionally
//! persisted) FIFO, dispatches them at a controlled rate, and reports
//! outcomes to the reporting endpoint.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sluice_adapters::{GraphqlFlowClient, HttpReporter};
use sluice_core::{Clock, KeyedRequest, SystemClock};
use sluice_engine::{spawn_daily, DispatchConfig, DispatchRunner, ScheduleAction};
use sluice_queue::{MemoryQueue, PersistedQueue, RequestQueue};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::env::Environment;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::load().context("failed to load environment")?;
    setup_logging(&environment.mode);
    info!(
        addr = %environment.addr,
        orchestrator = %environment.data_pipeline_addr,
        persisted = environment.data_pipeline_persisted_queue,
        parallelism = environment.data_pipeline_parallelism,
        "starting sluiced",
    );

    let queue: Arc<dyn RequestQueue<KeyedRequest>> = if environment.data_pipeline_persisted_queue {
        Arc::new(
            PersistedQueue::<KeyedRequest>::open(
                &environment.data_pipeline_queue_dir,
                &environment.data_pipeline_queue_name,
                environment.data_pipeline_queue_size,
            )
            .context("failed to open request queue")?,
        )
    } else {
        Arc::new(MemoryQueue::<KeyedRequest>::new(
            environment.data_pipeline_queue_size,
        ))
    };

    let timeout = Duration::from_secs(environment.data_pipeline_timeout_sec);
    let flows = Arc::new(
        GraphqlFlowClient::new(environment.data_pipeline_addr.clone(), timeout)
            .context("failed to build orchestrator client")?,
    );
    let reporter = Arc::new(
        HttpReporter::new(
            environment.causemos_addr.clone(),
            environment.causemos_username.clone(),
            environment.causemos_password.clone(),
            timeout,
        )
        .context("failed to build reporter client")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let runner = DispatchRunner::new(
        DispatchConfig {
            flow_name: environment.data_pipeline_flow_name.clone(),
            project_name: environment.data_pipeline_project_name.clone(),
            parallelism: environment.data_pipeline_parallelism,
            poll_interval: Duration::from_secs(environment.data_pipeline_poll_interval_sec),
            orchestrator_idempotency: environment
                .data_pipeline_idempotency_checks
                .use_orchestrator(),
            queue_dedup: environment.data_pipeline_idempotency_checks.use_queue(),
            agent_label_to_ignore: environment.agent_label_to_ignore.clone(),
        },
        Arc::clone(&queue),
        flows,
        reporter,
        Arc::clone(&clock),
    )
    .await;
    runner.start();

    if let Some(pause_at) = environment.pause_time {
        spawn_daily(Arc::clone(&runner), pause_at, ScheduleAction::Pause);
    }
    if let Some(resume_at) = environment.resume_time {
        spawn_daily(Arc::clone(&runner), resume_at, ScheduleAction::Resume);
    }

    let app = routes::create_router(AppState {
        queue: Arc::clone(&queue),
        runner: Arc::clone(&runner),
        clock,
        queue_dedup: environment.data_pipeline_idempotency_checks.use_queue(),
    });

    let addr = listen_addr(&environment.addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down");
    runner.stop();
    if let Err(e) = queue.close() {
        warn!(error = %e, "queue close failed");
    }
    Ok(())
}

/// Expand a Go-style `:port` listen address to a bindable form.
fn listen_addr(addr: &str) -> String {
    if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    }
}

fn setup_logging(mode: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if mode == "prod" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install shutdown handler");
    }
}

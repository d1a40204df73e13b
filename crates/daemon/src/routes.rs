// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router configuration for the control surface.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the router with every control-surface route.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/data-pipeline/enqueue", put(handlers::enqueue))
        .route("/data-pipeline/bulk-enqueue", put(handlers::bulk_enqueue))
        .route("/data-pipeline/status", get(handlers::status))
        .route("/data-pipeline/waiting", get(handlers::waiting))
        .route("/data-pipeline/jobs", get(handlers::jobs))
        .route("/data-pipeline/start", put(handlers::start))
        .route("/data-pipeline/stop", put(handlers::stop))
        .route("/data-pipeline/clear", put(handlers::clear))
        .route("/data-pipeline/force-flow", put(handlers::force_flow))
        .route(
            "/data-pipeline/retry-flow/{run_id}",
            put(handlers::retry_flow),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

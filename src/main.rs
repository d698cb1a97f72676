//! MindFlow Service: Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use anyhow::Context;
use mindflow::{build_state, create_router, logging, metrics::Metrics};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    logging::init_dev_tracing();

    let state = build_state().context("building application state")?;
    let metrics = Metrics::init().context("installing prometheus recorder")?;

    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}

// src/lib.rs
// Public library surface for integration tests (and reuse by other services).

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod query;
pub mod scoring;
pub mod store;
pub mod task;
pub mod time;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::scoring::{explain, score, select_best, ScoredTask, ScoringConfig, Selection};
pub use crate::task::{Status, Task};

use tracing::{info, warn};

/// Assemble state from env + config files. Bad scoring overrides fall back to
/// the built-in weights (logged); a bad seed file is an error.
pub fn build_state() -> anyhow::Result<AppState> {
    let cfg = config::AppConfig::from_env();

    let scoring = match config::load_scoring_default() {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "scoring config rejected, using defaults");
            ScoringConfig::default()
        }
    };

    let store = match &cfg.seed_path {
        Some(p) => {
            let tasks = config::load_seed_tasks(p)?;
            info!(count = tasks.len(), path = %p.display(), "seeded task store");
            store::TaskStore::with_tasks(tasks)
        }
        None => store::TaskStore::new(),
    };

    info!(environment = %cfg.environment, ?scoring, "mindflow state ready");
    Ok(AppState::new(cfg, scoring, store))
}

//! Runtime configuration: process env (optionally from `.env`) plus the
//! scoring overrides file.

pub mod scoring;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::audit::DEFAULT_AUDIT_CAPACITY;
use crate::task::Task;

pub use scoring::{load_scoring_default, load_scoring_from};

pub const ENV_ENVIRONMENT: &str = "MINDFLOW_ENV";
pub const ENV_AUDIT_CAPACITY: &str = "MINDFLOW_AUDIT_CAPACITY";
pub const ENV_SEED_PATH: &str = "MINDFLOW_SEED_PATH";
pub const ENV_DEV_LOG: &str = "MINDFLOW_DEV_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// "development" | "testing" | "production" (free-form, lowercased)
    pub environment: String,
    pub audit_capacity: usize,
    /// Optional JSON array of tasks loaded into the store at startup.
    pub seed_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            seed_path: None,
        }
    }
}

impl AppConfig {
    /// Read from the environment. Unparseable numbers fall back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        let environment = std::env::var(ENV_ENVIRONMENT)
            .ok()
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or(d.environment);
        let audit_capacity = std::env::var(ENV_AUDIT_CAPACITY)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(d.audit_capacity);
        let seed_path = std::env::var(ENV_SEED_PATH)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        Self {
            environment,
            audit_capacity,
            seed_path,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self.environment.as_str(), "local" | "development" | "dev")
    }
}

/// Dev logging gate: MINDFLOW_DEV_LOG=1 AND dev env (debug build or dev MINDFLOW_ENV).
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    on && (cfg!(debug_assertions) || AppConfig::from_env().is_dev())
}

/// Load seed tasks (JSON array, lenient per-field like any task snapshot).
pub fn load_seed_tasks(path: &Path) -> Result<Vec<Task>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed tasks from {}", path.display()))?;
    let tasks: Vec<Task> = serde_json::from_str(&data)
        .with_context(|| format!("parsing seed tasks {}", path.display()))?;
    Ok(tasks)
}

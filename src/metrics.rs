use anyhow::Result;
use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::audit::{Action, Outcome};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process (the binary does).
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn action_label(action: Action) -> &'static str {
    match action {
        Action::CreateTask => "create_task",
        Action::GetTask => "get_task",
        Action::ListTasks => "list_tasks",
        Action::UpdateTask => "update_task",
        Action::DeleteTask => "delete_task",
        Action::CompleteTask => "complete_task",
        Action::SnoozeTask => "snooze_task",
        Action::GetBestTask => "get_best_task",
        Action::QueryTasks => "query_tasks",
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "success",
        Outcome::Empty => "empty",
        Outcome::Error => "error",
    }
}

/// No-ops until a recorder is installed (e.g. in tests).
pub fn record_request(action: Action, outcome: Outcome, duration_ms: u64) {
    counter!(
        "mindflow_requests_total",
        "action" => action_label(action),
        "outcome" => outcome_label(outcome)
    )
    .increment(1);
    histogram!("mindflow_request_duration_ms", "action" => action_label(action))
        .record(duration_ms as f64);
}

pub fn record_selection(candidates: usize, score: Option<u8>) {
    histogram!("mindflow_selection_candidates").record(candidates as f64);
    if let Some(s) = score {
        histogram!("mindflow_best_task_score").record(f64::from(s));
    }
}

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::audit::{Action, AuditEntry, AuditLog, Outcome};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::logging::anon_hash;
use crate::metrics;
use crate::query::{self, TaskFilter};
use crate::scoring::{select_best_with, ScoreBreakdown, ScoringConfig, Selection};
use crate::store::TaskStore;
use crate::task::{NewTask, Status, Task, TaskPatch};
use crate::time::resolve_reference;

/// Origins allowed outside development (ChatGPT Apps SDK hosts).
const PROD_ORIGINS: &[&str] = &["https://chat.openai.com", "https://chatgpt.com"];

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub audit: Arc<AuditLog>,
    pub scoring: Arc<ScoringConfig>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, scoring: ScoringConfig, store: TaskStore) -> Self {
        Self {
            audit: Arc::new(AuditLog::with_capacity(config.audit_capacity)),
            store: Arc::new(store),
            scoring: Arc::new(scoring),
            config: Arc::new(config),
        }
    }

    fn track<T>(
        &self,
        action: Action,
        resource_id: Option<&str>,
        res: &Result<T, ApiError>,
        started: Instant,
    ) {
        let (result, error_message) = match res {
            Ok(_) => (Outcome::Success, None),
            Err(ApiError::NoActiveTasks) => (Outcome::Empty, None),
            Err(e) => (Outcome::Error, Some(e.to_string())),
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            target: "mindflow::api",
            ?action,
            ?result,
            duration_ms,
            error = ?error_message,
            "request handled"
        );
        metrics::record_request(action, result, duration_ms);
        self.audit.record(AuditEntry {
            ts: Utc::now(),
            action,
            resource_id: resource_id.map(str::to_string),
            result,
            error_message,
            duration_ms,
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            AppConfig::default(),
            ScoringConfig::default(),
            TaskStore::new(),
        )
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.is_dev() {
        CorsLayer::very_permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(
                PROD_ORIGINS.iter().copied().map(HeaderValue::from_static),
            ))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/score/best", post(score_best))
        .route("/api/score/query", post(score_query))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/best", get(best_task))
        .route("/api/tasks/pending", get(pending_tasks))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/complete", post(complete_task))
        .route("/api/tasks/{id}/snooze", post(snooze_task))
        .route("/debug/audit", get(debug_audit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthOut {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    Json(HealthOut {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ReferenceParams {
    #[serde(default)]
    now: Option<String>,
    #[serde(default)]
    tz: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BestReq {
    tasks: Vec<Task>,
    #[serde(flatten)]
    reference: ReferenceParams,
}

#[derive(Debug, Serialize)]
struct BestOut {
    task: Task,
    score: u8,
    reasoning: String,
    breakdown: ScoreBreakdown,
    evaluated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluated_at_local: Option<String>,
}

fn select(
    tasks: &[Task],
    reference: &ReferenceParams,
    cfg: &ScoringConfig,
) -> Result<BestOut, ApiError> {
    let (now, local) = resolve_reference(reference.now.as_deref(), reference.tz.as_deref())?;
    let selection = select_best_with(tasks, now, cfg);
    let candidates = tasks.iter().filter(|t| t.is_candidate(now)).count();
    match selection {
        Selection::Best(st) => {
            metrics::record_selection(candidates, Some(st.score));
            info!(
                target: "mindflow::select",
                task_id = %st.task.id,
                title = %anon_hash(&st.task.title),
                score = st.score,
                candidates,
                reasoning = %st.reasoning,
                "best task selected"
            );
            Ok(BestOut {
                task: st.task,
                score: st.score,
                reasoning: st.reasoning,
                breakdown: st.breakdown,
                evaluated_at: now,
                evaluated_at_local: local,
            })
        }
        Selection::NoCandidates => {
            metrics::record_selection(0, None);
            info!(target: "mindflow::select", total = tasks.len(), "no active tasks");
            Err(ApiError::NoActiveTasks)
        }
    }
}

/// Stateless selection over a caller-supplied snapshot.
async fn score_best(
    State(state): State<AppState>,
    Json(body): Json<BestReq>,
) -> Result<Json<BestOut>, ApiError> {
    let started = Instant::now();
    let res = select(&body.tasks, &body.reference, &state.scoring);
    let id = res.as_ref().ok().map(|b| b.task.id.clone());
    state.track(Action::GetBestTask, id.as_deref(), &res, started);
    res.map(Json)
}

#[derive(Debug, Deserialize)]
struct QueryReq {
    tasks: Vec<Task>,
    #[serde(flatten)]
    filter: TaskFilter,
}

fn checked_filter(filter: &TaskFilter) -> Result<(), ApiError> {
    if filter.status == Some(Status::Unknown) {
        return Err(ApiError::BadRequest(
            "status must be one of pending, in_progress, completed, snoozed".to_string(),
        ));
    }
    Ok(())
}

async fn score_query(
    State(state): State<AppState>,
    Json(body): Json<QueryReq>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let started = Instant::now();
    let res =
        checked_filter(&body.filter).map(|_| query::query(&body.tasks, &body.filter));
    state.track(Action::QueryTasks, None, &res, started);
    res.map(Json)
}

async fn best_task(
    State(state): State<AppState>,
    Query(reference): Query<ReferenceParams>,
) -> Result<Json<BestOut>, ApiError> {
    let started = Instant::now();
    let snapshot = state.store.snapshot();
    let res = select(&snapshot, &reference, &state.scoring);
    let id = res.as_ref().ok().map(|b| b.task.id.clone());
    state.track(Action::GetBestTask, id.as_deref(), &res, started);
    res.map(Json)
}

async fn pending_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let started = Instant::now();
    let out = query::active(&state.store.snapshot(), Utc::now());
    state.track::<()>(Action::ListTasks, None, &Ok(()), started);
    Json(out)
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let started = Instant::now();
    let res =
        checked_filter(&filter).map(|_| query::query(&state.store.snapshot(), &filter));
    state.track(Action::ListTasks, None, &res, started);
    res.map(Json)
}

async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let started = Instant::now();
    let res = state.store.create(body, Utc::now()).map_err(ApiError::from);
    let id = res.as_ref().ok().map(|t| t.id.clone());
    state.track(Action::CreateTask, id.as_deref(), &res, started);
    res.map(|t| (StatusCode::CREATED, Json(t)))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let started = Instant::now();
    let res = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()));
    state.track(Action::GetTask, Some(&id), &res, started);
    res.map(Json)
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let started = Instant::now();
    let res = state
        .store
        .update(&id, patch, Utc::now())
        .map_err(ApiError::from);
    state.track(Action::UpdateTask, Some(&id), &res, started);
    res.map(Json)
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let started = Instant::now();
    let res = if state.store.delete(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(id.clone()))
    };
    state.track(Action::DeleteTask, Some(&id), &res, started);
    res
}

async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let started = Instant::now();
    let res = state
        .store
        .complete(&id, Utc::now())
        .map_err(ApiError::from);
    state.track(Action::CompleteTask, Some(&id), &res, started);
    res.map(Json)
}

#[derive(Debug, Deserialize)]
struct SnoozeParams {
    #[serde(default)]
    hours: Option<i64>,
}

async fn snooze_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<SnoozeParams>,
) -> Result<Json<Task>, ApiError> {
    let started = Instant::now();
    let res = state
        .store
        .snooze(&id, params.hours, Utc::now())
        .map_err(ApiError::from);
    state.track(Action::SnoozeTask, Some(&id), &res, started);
    res.map(Json)
}

#[derive(Debug, Deserialize)]
struct AuditParams {
    #[serde(default)]
    limit: Option<usize>,
}

async fn debug_audit(
    State(state): State<AppState>,
    Query(params): Query<AuditParams>,
) -> Json<Vec<AuditEntry>> {
    Json(state.audit.snapshot_last_n(params.limit.unwrap_or(10)))
}

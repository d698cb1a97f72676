//! audit.rs: bounded in-memory log of API operations for quick diagnostics.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_AUDIT_CAPACITY: usize = 2000;
const MAX_AUDIT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    CreateTask,
    GetTask,
    ListTasks,
    UpdateTask,
    DeleteTask,
    CompleteTask,
    SnoozeTask,
    GetBestTask,
    QueryTasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    /// Normal "nothing to do" result, e.g. no active tasks.
    Empty,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub ts: DateTime<Utc>,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub result: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug)]
pub struct AuditLog {
    inner: Mutex<VecDeque<AuditEntry>>,
    cap: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, MAX_AUDIT_CAPACITY);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        }
    }

    pub fn record(&self, entry: AuditEntry) {
        let mut v = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if v.len() >= self.cap {
            v.pop_front();
        }
        v.push_back(entry);
    }

    /// Oldest first.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<AuditEntry> {
        let v = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let start = v.len().saturating_sub(n);
        v.iter().skip(start).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: Action, id: &str) -> AuditEntry {
        AuditEntry {
            ts: Utc::now(),
            action,
            resource_id: Some(id.to_string()),
            result: Outcome::Success,
            error_message: None,
            duration_ms: 0,
        }
    }

    #[test]
    fn keeps_only_the_newest_entries() {
        let log = AuditLog::with_capacity(2);
        log.record(entry(Action::CreateTask, "a"));
        log.record(entry(Action::UpdateTask, "b"));
        log.record(entry(Action::DeleteTask, "c"));
        let rows = log.snapshot_last_n(10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].resource_id.as_deref(), Some("b"));
        assert_eq!(rows[1].action, Action::DeleteTask);
    }

    #[test]
    fn full_log_keeps_rolling_in_order() {
        let log = AuditLog::with_capacity(3);
        for i in 0..10 {
            log.record(entry(Action::GetTask, &i.to_string()));
        }
        let ids: Vec<_> = log
            .snapshot_last_n(10)
            .into_iter()
            .filter_map(|e| e.resource_id)
            .collect();
        assert_eq!(ids, ["7", "8", "9"]);
        assert_eq!(log.snapshot_last_n(1)[0].resource_id.as_deref(), Some("9"));
    }

    #[test]
    fn serializes_action_names_like_the_audit_table() {
        let v = serde_json::to_value(entry(Action::GetBestTask, "x")).unwrap();
        assert_eq!(v["action"], "GET_BEST_TASK");
        assert_eq!(v["result"], "success");
        assert!(v.get("error_message").is_none());
    }
}

//! Task queries that never touch the scorer: filter by status/priority, limit.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::task::{Status, Task};

/// Filter applied in order: status, priority bounds, then `limit`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub min_priority: Option<u8>,
    #[serde(default)]
    pub max_priority: Option<u8>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(s) = self.status {
            if task.status != s {
                return false;
            }
        }
        let p = task.effective_priority();
        if self.min_priority.is_some_and(|min| p < min) {
            return false;
        }
        if self.max_priority.is_some_and(|max| p > max) {
            return false;
        }
        true
    }
}

/// Matching tasks in input order.
pub fn query(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| filter.matches(t))
        .take(filter.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Tasks eligible for selection at `now` (not completed, not currently snoozed).
pub fn active(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    tasks.iter().filter(|t| t.is_candidate(now)).cloned().collect()
}

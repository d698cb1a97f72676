//! store.rs: in-memory task collection behind the REST endpoints.
//!
//! Holds tasks in insertion order. Handlers take a `snapshot()` and score it
//! outside the lock.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::task::{snooze_duration, NewTask, Status, Task, TaskPatch, ValidationError};

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Task {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Default)]
pub struct TaskStore {
    inner: Mutex<Vec<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records (e.g. a fixture file), keeping their ids.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            inner: Mutex::new(tasks),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        // recover from poisoning
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create(&self, new: NewTask, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let task = new.into_task(now)?;
        self.lock().push(task.clone());
        Ok(task)
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().iter().find(|t| t.id == id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn update(
        &self,
        id: &str,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        self.modify(id, |t| patch.apply(t, now))
    }

    pub fn complete(&self, id: &str, now: DateTime<Utc>) -> Result<Task, StoreError> {
        self.modify(id, |t| {
            if t.status != Status::Completed {
                t.status = Status::Completed;
                t.completed_at = Some(now);
            }
            t.updated_at = Some(now);
            Ok(())
        })
    }

    /// Snooze for `hours` (default 3). Re-snoozing pushes the wake-up time from `now`.
    pub fn snooze(
        &self,
        id: &str,
        hours: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let dur = snooze_duration(hours)?;
        self.modify(id, |t| {
            t.status = Status::Snoozed;
            t.snoozed_until = Some(now + dur);
            t.updated_at = Some(now);
            Ok(())
        })
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut v = self.lock();
        let before = v.len();
        v.retain(|t| t.id != id);
        v.len() != before
    }

    fn modify<F>(&self, id: &str, f: F) -> Result<Task, StoreError>
    where
        F: FnOnce(&mut Task) -> Result<(), ValidationError>,
    {
        let mut v = self.lock();
        let task = v
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(task)?;
        Ok(task.clone())
    }
}

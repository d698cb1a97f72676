//! Task record, status, and data-entry validation.
//!
//! `Task` is the shape exchanged with callers and held by the store. Reading a
//! task is lenient (bad fields degrade to defaults); writing one through
//! `NewTask`/`TaskPatch` is strict and reports a `ValidationError`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::time::{self, de_lenient_opt};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;
/// Used whenever a stored priority is missing or out of range.
pub const DEFAULT_PRIORITY: u8 = 3;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const TAGS_MAX_CHARS: usize = 500;
pub const EFFORT_MAX_MINUTES: i64 = 480;
pub const SNOOZE_DEFAULT_HOURS: i64 = 3;
pub const SNOOZE_MAX_HOURS: i64 = 168;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    Snoozed,
    /// Any status string we don't recognise. Never excluded, never gets momentum.
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Snoozed => "snoozed",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            "snoozed" => Ok(Status::Snoozed),
            other => Err(ValidationError::Status(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw stored priority; use [`Task::effective_priority`] for anything computed.
    #[serde(default, deserialize_with = "de_lenient_priority")]
    pub priority: Option<i64>,
    #[serde(default, deserialize_with = "de_lenient_status")]
    pub status: Status,
    #[serde(default, deserialize_with = "de_lenient_opt")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_lenient_opt")]
    pub snoozed_until: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_lenient_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "de_lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "de_lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_estimate_minutes: Option<u32>,
}

impl Task {
    /// Minimal pending task, mostly for tests and callers building snapshots by hand.
    pub fn new(id: impl Into<String>, title: impl Into<String>, priority: u8) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            priority: Some(i64::from(priority)),
            status: Status::Pending,
            due_date: None,
            snoozed_until: None,
            created_at: None,
            updated_at: None,
            completed_at: None,
            tags: None,
            effort_estimate_minutes: None,
        }
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn due(mut self, at: DateTime<Utc>) -> Self {
        self.due_date = Some(at);
        self
    }

    pub fn snoozed_until(mut self, at: DateTime<Utc>) -> Self {
        self.snoozed_until = Some(at);
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Priority clamped to the valid tier range; missing or out-of-range reads as medium.
    pub fn effective_priority(&self) -> u8 {
        match self.priority {
            Some(p) if in_priority_range(p) => p as u8,
            _ => DEFAULT_PRIORITY,
        }
    }

    /// Eligible for best-task selection at `now`: not completed and not sleeping.
    pub fn is_candidate(&self, now: DateTime<Utc>) -> bool {
        if self.status == Status::Completed {
            return false;
        }
        !matches!(self.snoozed_until, Some(until) if until > now)
    }
}

fn de_lenient_priority<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn de_lenient_status<'de, D>(deserializer: D) -> Result<Status, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(Status::Unknown),
        None | Some(serde_json::Value::Null) => Status::default(),
        Some(_) => Status::Unknown,
    })
}

/// Distinguishes "field absent" from "field set to null" in patches.
fn de_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("priority must be between 1 and 5, got {0}")]
    Priority(i64),
    #[error("effort_estimate_minutes must be between 1 and 480, got {0}")]
    Effort(i64),
    #[error("unknown status: {0}")]
    Status(String),
    #[error("invalid timestamp for {field}: {value}")]
    Timestamp { field: &'static str, value: String },
    #[error("snooze hours must be between 1 and 168, got {0}")]
    SnoozeHours(i64),
}

/// Request body for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub effort_estimate_minutes: Option<i64>,
}

impl NewTask {
    /// Validate and sanitize into a fresh pending task stamped at `now`.
    pub fn into_task(self, now: DateTime<Utc>) -> Result<Task, ValidationError> {
        let title = clean_title(&self.title)?;
        let description = self
            .description
            .as_deref()
            .map(clean_description)
            .transpose()?;
        let priority = check_priority(self.priority.unwrap_or(i64::from(DEFAULT_PRIORITY)))?;
        let due_date = self
            .due_date
            .as_deref()
            .map(|raw| parse_field("due_date", raw))
            .transpose()?;
        let tags = self.tags.map(check_tags).transpose()?;
        let effort = self.effort_estimate_minutes.map(check_effort).transpose()?;

        Ok(Task {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            priority: Some(priority),
            status: Status::Pending,
            due_date,
            snoozed_until: None,
            created_at: Some(now),
            updated_at: Some(now),
            completed_at: None,
            tags,
            effort_estimate_minutes: effort,
        })
    }
}

/// Request body for a partial update. Absent fields are left untouched;
/// `due_date`/`snoozed_until` may be set to `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default, deserialize_with = "de_present")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "de_present")]
    pub snoozed_until: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub effort_estimate_minutes: Option<i64>,
}

impl TaskPatch {
    /// Validate every field first, then mutate; a rejected patch leaves `task` unchanged.
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let title = self.title.as_deref().map(clean_title).transpose()?;
        let description = self
            .description
            .as_deref()
            .map(clean_description)
            .transpose()?;
        let status = self.status.as_deref().map(Status::from_str).transpose()?;
        let priority = self.priority.map(check_priority).transpose()?;
        let due_date = self
            .due_date
            .map(|v| parse_clearable("due_date", v))
            .transpose()?;
        let snoozed_until = self
            .snoozed_until
            .map(|v| parse_clearable("snoozed_until", v))
            .transpose()?;
        let tags = self.tags.map(check_tags).transpose()?;
        let effort = self.effort_estimate_minutes.map(check_effort).transpose()?;

        if let Some(t) = title {
            task.title = t;
        }
        if let Some(d) = description {
            task.description = Some(d);
        }
        if let Some(s) = status {
            if s == Status::Completed && task.status != Status::Completed {
                task.completed_at = Some(now);
            }
            task.status = s;
        }
        if let Some(p) = priority {
            task.priority = Some(p);
        }
        if let Some(d) = due_date {
            task.due_date = d;
        }
        if let Some(s) = snoozed_until {
            task.snoozed_until = s;
        }
        if let Some(t) = tags {
            task.tags = Some(t);
        }
        if let Some(e) = effort {
            task.effort_estimate_minutes = Some(e);
        }
        task.updated_at = Some(now);
        Ok(())
    }
}

/// Validate a snooze duration; `None` means the default.
pub fn snooze_duration(hours: Option<i64>) -> Result<Duration, ValidationError> {
    let h = hours.unwrap_or(SNOOZE_DEFAULT_HOURS);
    if !(1..=SNOOZE_MAX_HOURS).contains(&h) {
        return Err(ValidationError::SnoozeHours(h));
    }
    Ok(Duration::hours(h))
}

fn clean_title(raw: &str) -> Result<String, ValidationError> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if t.chars().count() > TITLE_MAX_CHARS {
        return Err(ValidationError::TooLong {
            field: "title",
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(escape(t))
}

fn clean_description(raw: &str) -> Result<String, ValidationError> {
    if raw.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::TooLong {
            field: "description",
            max: DESCRIPTION_MAX_CHARS,
        });
    }
    Ok(escape(raw))
}

fn check_tags(raw: String) -> Result<String, ValidationError> {
    if raw.chars().count() > TAGS_MAX_CHARS {
        return Err(ValidationError::TooLong {
            field: "tags",
            max: TAGS_MAX_CHARS,
        });
    }
    Ok(raw)
}

fn in_priority_range(p: i64) -> bool {
    (i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)).contains(&p)
}

fn check_priority(p: i64) -> Result<i64, ValidationError> {
    if in_priority_range(p) {
        Ok(p)
    } else {
        Err(ValidationError::Priority(p))
    }
}

fn check_effort(m: i64) -> Result<u32, ValidationError> {
    if (1..=EFFORT_MAX_MINUTES).contains(&m) {
        Ok(m as u32)
    } else {
        Err(ValidationError::Effort(m))
    }
}

fn parse_field(field: &'static str, raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    time::parse_iso(raw).ok_or_else(|| ValidationError::Timestamp {
        field,
        value: raw.to_string(),
    })
}

/// A patch value of `null` clears the field.
fn parse_clearable(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    raw.map(|r| parse_field(field, &r)).transpose()
}

fn escape(s: &str) -> String {
    html_escape::encode_quoted_attribute(s).into_owned()
}

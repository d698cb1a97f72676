//! # Task Scorer
//! Pure, testable logic that maps `(task, now)` → score, best-task selection
//! and a human-readable explanation. No I/O, no hidden state.
//!
//! Policy: a weighted sum of four sub-scores, each in [0,100]:
//!
//! ```text
//! total = 0.40 * priority + 0.35 * urgency + 0.15 * context + 0.10 * momentum
//! ```
//!
//! rounded half-up to an integer. Completed tasks and tasks snoozed past `now`
//! are never candidates. Ties go to the first candidate in input order; callers
//! must not rely on which of two equal tasks wins if they reorder the input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Status, Task};
use crate::time::{days_since, hours_between};

pub const WEIGHT_PRIORITY: f64 = 0.40;
pub const WEIGHT_URGENCY: f64 = 0.35;
pub const WEIGHT_CONTEXT: f64 = 0.15;
pub const WEIGHT_MOMENTUM: f64 = 0.10;

pub const PRIORITY_POINTS_PER_TIER: f64 = 20.0;

// Urgency bands, in hours until due.
pub const URGENCY_CRITICAL_HOURS: f64 = 4.0;
pub const URGENCY_TODAY_HOURS: f64 = 24.0;
pub const URGENCY_SOON_HOURS: f64 = 72.0;
/// Linear decay reaches zero here (10 days).
pub const URGENCY_DECAY_HOURS: f64 = 240.0;

pub const URGENCY_OVERDUE: f64 = 100.0;
pub const URGENCY_CRITICAL: f64 = 90.0;
pub const URGENCY_TODAY: f64 = 75.0;
pub const URGENCY_SOON: f64 = 50.0;

/// Placeholder for time-of-day awareness; override via [`ScoringConfig::context_score`].
pub const CONTEXT_SCORE: f64 = 50.0;

pub const MOMENTUM_IN_PROGRESS: f64 = 80.0;
pub const MOMENTUM_PER_DAY: f64 = 5.0;
/// Age-based momentum stops growing after 8 days.
pub const MOMENTUM_AGE_CAP: f64 = 40.0;

pub const MAX_SCORE: u8 = 100;

/// Snap to 1e-6 before rounding so 78.99999999999999 is treated as 79.
const ROUNDING_SNAP: f64 = 1e6;

pub const REASON_SEPARATOR: &str = " + ";

/// Relative weights of the four sub-scores.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub priority: f64,
    pub urgency: f64,
    pub context: f64,
    pub momentum: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            priority: WEIGHT_PRIORITY,
            urgency: WEIGHT_URGENCY,
            context: WEIGHT_CONTEXT,
            momentum: WEIGHT_MOMENTUM,
        }
    }
}

/// Tunables for a scoring run. `Default` is the canonical formula.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    pub context_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            context_score: CONTEXT_SCORE,
        }
    }
}

impl ScoringConfig {
    /// Weights must be finite and non-negative; the context score must lie in [0,100].
    pub fn is_valid(&self) -> bool {
        let w = &self.weights;
        [w.priority, w.urgency, w.context, w.momentum]
            .iter()
            .all(|x| x.is_finite() && *x >= 0.0)
            && (0.0..=100.0).contains(&self.context_score)
    }
}

/// The four sub-scores behind a total, each in [0,100].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub priority: f64,
    pub urgency: f64,
    pub context: f64,
    pub momentum: f64,
}

impl ScoreBreakdown {
    pub fn total(&self, w: &Weights) -> u8 {
        let raw = w.priority * self.priority
            + w.urgency * self.urgency
            + w.context * self.context
            + w.momentum * self.momentum;
        round_half_up(raw).clamp(0.0, f64::from(MAX_SCORE)) as u8
    }
}

/// A task together with its score and explanation. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredTask {
    pub task: Task,
    pub score: u8,
    pub reasoning: String,
    pub breakdown: ScoreBreakdown,
}

/// Outcome of best-task selection. `NoCandidates` is a normal result, not a failure.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Best(Box<ScoredTask>),
    NoCandidates,
}

impl Selection {
    pub fn best(self) -> Option<ScoredTask> {
        match self {
            Selection::Best(st) => Some(*st),
            Selection::NoCandidates => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::NoCandidates)
    }
}

/// Round to the nearest integer, halves upward.
pub fn round_half_up(x: f64) -> f64 {
    let snapped = (x * ROUNDING_SNAP).round() / ROUNDING_SNAP;
    (snapped + 0.5).floor()
}

pub fn priority_score(task: &Task) -> f64 {
    f64::from(task.effective_priority()) * PRIORITY_POINTS_PER_TIER
}

/// Urgency for a given number of hours until due (negative = overdue).
pub fn urgency_for_hours(hours: f64) -> f64 {
    if hours < 0.0 {
        URGENCY_OVERDUE
    } else if hours < URGENCY_CRITICAL_HOURS {
        URGENCY_CRITICAL
    } else if hours < URGENCY_TODAY_HOURS {
        URGENCY_TODAY
    } else if hours < URGENCY_SOON_HOURS {
        URGENCY_SOON
    } else {
        (100.0 - hours / URGENCY_DECAY_HOURS * 100.0).max(0.0)
    }
}

pub fn urgency_score(task: &Task, now: DateTime<Utc>) -> f64 {
    match task.due_date {
        // compared on the instants so sub-second lateness still counts
        Some(due) if due < now => URGENCY_OVERDUE,
        Some(due) => urgency_for_hours(hours_between(now, due)),
        None => 0.0,
    }
}

pub fn momentum_score(task: &Task, now: DateTime<Utc>) -> f64 {
    match task.status {
        Status::InProgress => MOMENTUM_IN_PROGRESS,
        Status::Pending => task
            .created_at
            .map(|created| {
                (days_since(created, now).max(0.0) * MOMENTUM_PER_DAY).min(MOMENTUM_AGE_CAP)
            })
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn breakdown(task: &Task, now: DateTime<Utc>, cfg: &ScoringConfig) -> ScoreBreakdown {
    ScoreBreakdown {
        priority: priority_score(task),
        urgency: urgency_score(task, now),
        context: cfg.context_score,
        momentum: momentum_score(task, now),
    }
}

/// Score with the canonical weights.
pub fn score(task: &Task, now: DateTime<Utc>) -> u8 {
    score_with(task, now, &ScoringConfig::default())
}

pub fn score_with(task: &Task, now: DateTime<Utc>, cfg: &ScoringConfig) -> u8 {
    breakdown(task, now, cfg).total(&cfg.weights)
}

pub fn priority_label(priority: u8) -> &'static str {
    match priority {
        5 => "urgent",
        4 => "high",
        3 => "normal",
        2 => "low",
        1 => "nice-to-have",
        _ => "normal",
    }
}

/// Reasoning string built from the same fields the score uses, e.g.
/// `"urgent priority (5) + due in 1 hours"`.
pub fn explain(task: &Task, now: DateTime<Utc>) -> String {
    let p = task.effective_priority();
    let mut clauses = vec![format!("{} priority ({})", priority_label(p), p)];

    if let Some(due) = task.due_date {
        let hours = hours_between(now, due);
        if due < now {
            clauses.push("OVERDUE".to_string());
        } else if hours < URGENCY_TODAY_HOURS {
            clauses.push(format!("due in {} hours", round_half_up(hours) as i64));
        } else {
            clauses.push(format!("due in {} days", (hours / 24.0).floor() as i64));
        }
    }

    if task.status == Status::InProgress {
        clauses.push("already started".to_string());
    }

    clauses.join(REASON_SEPARATOR)
}

pub fn score_task(task: &Task, now: DateTime<Utc>, cfg: &ScoringConfig) -> ScoredTask {
    let breakdown = breakdown(task, now, cfg);
    ScoredTask {
        task: task.clone(),
        score: breakdown.total(&cfg.weights),
        reasoning: explain(task, now),
        breakdown,
    }
}

/// Pick the highest-scoring candidate with the canonical weights.
pub fn select_best(tasks: &[Task], now: DateTime<Utc>) -> Selection {
    select_best_with(tasks, now, &ScoringConfig::default())
}

pub fn select_best_with(tasks: &[Task], now: DateTime<Utc>, cfg: &ScoringConfig) -> Selection {
    let mut best: Option<(&Task, u8)> = None;
    for task in tasks.iter().filter(|t| t.is_candidate(now)) {
        let s = score_with(task, now, cfg);
        // strictly greater: earlier candidates keep ties
        if best.map_or(true, |(_, top)| s > top) {
            best = Some((task, s));
        }
    }
    match best {
        Some((task, _)) => Selection::Best(Box::new(score_task(task, now, cfg))),
        None => Selection::NoCandidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn urgent_task_due_in_an_hour_scores_79() {
        let t = Task::new("a", "Call bank", 5)
            .due(now() + Duration::hours(1))
            .created(now());
        let b = breakdown(&t, now(), &ScoringConfig::default());
        assert_eq!(b.priority, 100.0);
        assert_eq!(b.urgency, 90.0);
        assert_eq!(b.context, 50.0);
        assert_eq!(b.momentum, 0.0);
        assert_eq!(score(&t, now()), 79);
        assert_eq!(explain(&t, now()), "urgent priority (5) + due in 1 hours");
    }

    #[test]
    fn overdue_in_progress_rounds_half_up_to_75() {
        let t = Task::new("b", "Tax return", 3)
            .status(Status::InProgress)
            .due(now() - Duration::days(2));
        // 24 + 35 + 7.5 + 8 = 74.5
        assert_eq!(score(&t, now()), 75);
        assert_eq!(
            explain(&t, now()),
            "normal priority (3) + OVERDUE + already started"
        );
    }

    #[test]
    fn urgency_bands_and_decay() {
        assert_eq!(urgency_for_hours(-0.01), 100.0);
        assert_eq!(urgency_for_hours(0.0), 90.0);
        assert_eq!(urgency_for_hours(3.99), 90.0);
        assert_eq!(urgency_for_hours(4.0), 75.0);
        assert_eq!(urgency_for_hours(23.99), 75.0);
        assert_eq!(urgency_for_hours(24.0), 50.0);
        assert_eq!(urgency_for_hours(71.99), 50.0);
        assert!((urgency_for_hours(72.0) - 70.0).abs() < 1e-9);
        assert!((urgency_for_hours(120.0) - 50.0).abs() < 1e-9);
        assert_eq!(urgency_for_hours(240.0), 0.0);
        assert_eq!(urgency_for_hours(1000.0), 0.0);
    }

    #[test]
    fn sub_millisecond_lateness_is_overdue() {
        let t = Task::new("x", "Just missed", 3)
            .due(now() - Duration::microseconds(400));
        assert_eq!(urgency_score(&t, now()), 100.0);
        assert_eq!(explain(&t, now()), "normal priority (3) + OVERDUE");

        let t = Task::new("y", "Nanos late", 3)
            .due(now() - Duration::nanoseconds(1));
        assert_eq!(urgency_score(&t, now()), 100.0);

        let on_time = Task::new("z", "Right now", 3).due(now());
        assert_eq!(urgency_score(&on_time, now()), 90.0);
        assert_eq!(
            explain(&on_time, now()),
            "normal priority (3) + due in 0 hours"
        );
    }

    #[test]
    fn no_due_date_means_no_urgency() {
        let t = Task::new("c", "Someday", 3);
        assert_eq!(urgency_score(&t, now()), 0.0);
        assert_eq!(explain(&t, now()), "normal priority (3)");
    }

    #[test]
    fn momentum_by_status_and_age() {
        let fresh = Task::new("d", "New", 3).created(now());
        assert_eq!(momentum_score(&fresh, now()), 0.0);

        let three_days = Task::new("d", "Aging", 3)
            .created(now() - Duration::days(3));
        assert!((momentum_score(&three_days, now()) - 15.0).abs() < 1e-9);

        let old = Task::new("d", "Ancient", 3)
            .created(now() - Duration::days(30));
        assert_eq!(momentum_score(&old, now()), 40.0);

        let future = Task::new("d", "Clock skew", 3)
            .created(now() + Duration::days(1));
        assert_eq!(momentum_score(&future, now()), 0.0);

        let started = Task::new("d", "Doing", 3).status(Status::InProgress);
        assert_eq!(momentum_score(&started, now()), 80.0);

        let snoozed = Task::new("d", "Later", 3)
            .status(Status::Snoozed)
            .created(now() - Duration::days(30));
        assert_eq!(momentum_score(&snoozed, now()), 0.0);

        let no_created = Task::new("d", "Legacy", 3);
        assert_eq!(momentum_score(&no_created, now()), 0.0);
    }

    #[test]
    fn round_half_up_boundaries() {
        assert_eq!(round_half_up(74.5), 75.0);
        assert_eq!(round_half_up(74.49999), 74.0);
        assert_eq!(round_half_up(78.99999999999999), 79.0);
        assert_eq!(round_half_up(0.5), 1.0);
        assert_eq!(round_half_up(0.0), 0.0);
    }

    #[test]
    fn explain_rounds_hours_and_floors_days() {
        let n = now();
        let in_90m = Task::new("e", "x", 2).due(n + Duration::minutes(90));
        assert_eq!(explain(&in_90m, n), "low priority (2) + due in 2 hours");

        let in_23h40 = Task::new("e", "x", 2)
            .due(n + Duration::minutes(23 * 60 + 40));
        assert_eq!(explain(&in_23h40, n), "low priority (2) + due in 24 hours");

        let in_47h = Task::new("e", "x", 1).due(n + Duration::hours(47));
        assert_eq!(explain(&in_47h, n), "nice-to-have priority (1) + due in 1 days");

        let exactly_now = Task::new("e", "x", 4).due(n);
        assert_eq!(explain(&exactly_now, n), "high priority (4) + due in 0 hours");
    }

    #[test]
    fn invalid_priority_explains_as_normal() {
        let mut t = Task::new("f", "x", 3);
        t.priority = Some(42);
        assert_eq!(explain(&t, now()), "normal priority (3)");
        assert_eq!(priority_score(&t), 60.0);
    }

    #[test]
    fn ties_keep_first_candidate() {
        let a = Task::new("first", "A", 4);
        let b = Task::new("second", "B", 4);
        let sel = select_best(&[a, b], now()).best().unwrap();
        assert_eq!(sel.task.id, "first");
    }

    #[test]
    fn empty_and_all_completed_yield_no_candidates() {
        assert!(select_best(&[], now()).is_empty());
        let done = Task::new("g", "Done", 5).status(Status::Completed);
        assert_eq!(select_best(&[done], now()), Selection::NoCandidates);
    }

    #[test]
    fn context_override_changes_total() {
        let t = Task::new("h", "x", 3);
        let cfg = ScoringConfig {
            context_score: 100.0,
            ..ScoringConfig::default()
        };
        // 24 + 0 + 7.5 = 31.5 -> 32 ; 24 + 0 + 15 = 39
        assert_eq!(score(&t, now()), 32);
        assert_eq!(score_with(&t, now(), &cfg), 39);
    }

    #[test]
    fn config_validation() {
        assert!(ScoringConfig::default().is_valid());
        let mut bad = ScoringConfig::default();
        bad.weights.urgency = -0.1;
        assert!(!bad.is_valid());
        let mut nan = ScoringConfig::default();
        nan.weights.priority = f64::NAN;
        assert!(!nan.is_valid());
        let mut ctx = ScoringConfig::default();
        ctx.context_score = 120.0;
        assert!(!ctx.is_valid());
    }
}

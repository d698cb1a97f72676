// tests/scoring_properties.rs
//
// Behavioural properties of the scorer through the public library API.

use chrono::{DateTime, Duration, TimeZone, Utc};

use mindflow::scoring::{self, urgency_score, ScoringConfig, Weights};
use mindflow::{explain, score, select_best, Selection, Status, Task};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 14, 0, 0).unwrap()
}

#[test]
fn score_is_strictly_increasing_in_priority() {
    let shapes: Vec<Box<dyn Fn(u8) -> Task>> = vec![
        Box::new(|p| Task::new("t", "bare", p)),
        Box::new(|p| Task::new("t", "due", p).due(now() + Duration::hours(30))),
        Box::new(|p| {
            Task::new("t", "overdue", p)
                .status(Status::InProgress)
                .due(now() - Duration::hours(1))
        }),
        Box::new(|p| {
            Task::new("t", "old", p).created(now() - Duration::days(20))
        }),
    ];
    for shape in shapes {
        let scores: Vec<u8> = (1..=5).map(|p| score(&shape(p), now())).collect();
        assert!(
            scores.windows(2).all(|w| w[0] < w[1]),
            "not strictly increasing: {scores:?}"
        );
    }
}

#[test]
fn past_due_is_always_full_urgency() {
    for (p, status, overdue) in [
        (1, Status::Pending, Duration::seconds(1)),
        (5, Status::InProgress, Duration::days(400)),
        (3, Status::Snoozed, Duration::minutes(5)),
    ] {
        let t = Task::new("x", "x", p)
            .status(status)
            .due(now() - overdue);
        assert_eq!(urgency_score(&t, now()), 100.0);
    }
}

#[test]
fn decay_bottoms_out_at_zero() {
    for hours in [240, 241, 500, 10_000] {
        let t = Task::new("x", "x", 3).due(now() + Duration::hours(hours));
        let u = urgency_score(&t, now());
        assert_eq!(u, 0.0, "urgency at {hours}h should be 0, got {u}");
    }
    let t = Task::new("x", "x", 3).due(now() + Duration::hours(239));
    assert!(urgency_score(&t, now()) > 0.0);
}

#[test]
fn completed_tasks_are_never_selected() {
    let done = Task::new("done", "Finished", 5)
        .status(Status::Completed)
        .due(now() - Duration::days(3));
    let meh = Task::new("meh", "Whenever", 1);
    assert!(score(&done, now()) > score(&meh, now()));

    let best = select_best(&[done.clone(), meh], now()).best().unwrap();
    assert_eq!(best.task.id, "meh");
    assert_eq!(select_best(&[done], now()), Selection::NoCandidates);
}

#[test]
fn snooze_boundary_is_strict() {
    let sleeping = Task::new("s", "Sleeping", 5)
        .status(Status::Snoozed)
        .snoozed_until(now() + Duration::seconds(1));
    assert!(select_best(&[sleeping], now()).is_empty());

    let awake = Task::new("s", "Awake", 5)
        .status(Status::Snoozed)
        .snoozed_until(now() - Duration::seconds(1));
    let best = select_best(&[awake], now()).best().unwrap();
    assert_eq!(best.task.id, "s");
}

#[test]
fn scoring_is_deterministic() {
    let t = Task::new("d", "Repeat", 4)
        .due(now() + Duration::hours(100))
        .created(now() - Duration::hours(50));
    assert_eq!(score(&t, now()), score(&t, now()));
    assert_eq!(explain(&t, now()), explain(&t, now()));
    assert_eq!(select_best(&[t.clone()], now()), select_best(&[t], now()));
}

#[test]
fn worked_examples() {
    let a = Task::new("a", "Send invoice", 5)
        .due(now() + Duration::hours(1))
        .created(now());
    assert_eq!(score(&a, now()), 79);
    assert_eq!(explain(&a, now()), "urgent priority (5) + due in 1 hours");

    let b = Task::new("b", "Fix prod", 3)
        .status(Status::InProgress)
        .due(now() - Duration::days(2));
    assert_eq!(score(&b, now()), 75);
    assert_eq!(
        explain(&b, now()),
        "normal priority (3) + OVERDUE + already started"
    );

    let picked = select_best(&[b, a], now()).best().unwrap();
    assert_eq!(picked.task.id, "a");
    assert_eq!(picked.score, 79);
    assert_eq!(picked.reasoning, "urgent priority (5) + due in 1 hours");
}

#[test]
fn empty_list_is_no_candidates() {
    assert_eq!(select_best(&[], now()), Selection::NoCandidates);
}

#[test]
fn reordered_ties_pick_the_first_seen() {
    let x = Task::new("x", "X", 2);
    let y = Task::new("y", "Y", 2);
    let first = select_best(&[x.clone(), y.clone()], now()).best().unwrap();
    let second = select_best(&[y, x], now()).best().unwrap();
    assert_eq!(first.task.id, "x");
    assert_eq!(second.task.id, "y");
    assert_eq!(first.score, second.score);
}

#[test]
fn reweighting_can_flip_the_winner() {
    let important = Task::new("imp", "Important", 5);
    let due_soon = Task::new("soon", "Due soon", 1)
        .due(now() + Duration::hours(2));
    let tasks = [important, due_soon];

    let default_pick = select_best(&tasks, now()).best().unwrap();
    assert_eq!(default_pick.task.id, "imp");

    let urgency_only = ScoringConfig {
        weights: Weights {
            priority: 0.0,
            urgency: 1.0,
            context: 0.0,
            momentum: 0.0,
        },
        ..ScoringConfig::default()
    };
    let pick = scoring::select_best_with(&tasks, now(), &urgency_only)
        .best()
        .unwrap();
    assert_eq!(pick.task.id, "soon");
    assert_eq!(pick.score, 90);
}

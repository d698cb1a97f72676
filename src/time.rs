//! Time helpers: lenient ISO-8601 parsing and reference-time resolution.
//!
//! Task snapshots arrive with timestamps as strings. RFC 3339 (with offset) is
//! the canonical form; naive `YYYY-MM-DDTHH:MM:SS[.f]` values, as written by
//! older clients, are read as UTC. Anything else is treated as absent so a
//! single bad field never rejects a record.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp into UTC. Returns `None` for anything unparseable.
pub fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    // Date-only: midnight UTC.
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Strict variant for request parameters, where a typo should be reported.
pub fn parse_iso_strict(raw: &str) -> Result<DateTime<Utc>> {
    parse_iso(raw).ok_or_else(|| anyhow!("invalid ISO-8601 timestamp: {raw}"))
}

/// Parse an IANA timezone name like "Europe/Prague".
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| anyhow!("invalid timezone: {name}"))
}

/// Resolve the reference time for a selection request.
/// `now` defaults to the current instant; `tz` only affects the local rendering.
pub fn resolve_reference(
    now: Option<&str>,
    tz: Option<&str>,
) -> Result<(DateTime<Utc>, Option<String>)> {
    let at = match now {
        Some(raw) => parse_iso_strict(raw)?,
        None => Utc::now(),
    };
    let local = match tz {
        Some(name) => Some(at.with_timezone(&parse_tz(name)?).to_rfc3339()),
        None => None,
    };
    Ok((at, local))
}

/// Hours from `now` until `at` (negative when `at` is in the past).
pub fn hours_between(now: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    as_seconds(at - now) / 3_600.0
}

/// Days from `since` until `now` (negative when `since` is in the future).
pub fn days_since(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    as_seconds(now - since) / 86_400.0
}

/// Fractional seconds at microsecond resolution; falls back to milliseconds
/// for spans too large to count in microseconds.
fn as_seconds(d: Duration) -> f64 {
    d.num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| d.num_milliseconds() as f64 / 1_000.0)
}

/// serde helper: optional timestamp that degrades to `None` instead of failing.
pub fn de_lenient_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_iso(&s),
        _ => None,
    })
}

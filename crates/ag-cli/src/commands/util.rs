//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)\s+(minute|hour|day|week)s?\s+ago|in\s+(\d+)\s+(minute|hour|day|week)s?)$")
        .unwrap()
});

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// The local wall-clock instant relative phrases are resolved against.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Parse a time argument as a calendar value or relative to `now`.
///
/// Supports:
/// - Dates: "2025-06-10" (midnight)
/// - Date and time: "2025-06-10 18:30", "2025-06-10T18:30:00"
/// - "now"
/// - Relative: "2 hours ago", "30 minutes ago", "in 3 days", "in 1 week"
pub fn parse_time(s: &str, now: NaiveDateTime) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    for format in DATETIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(at);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time: {s}. Use a date (e.g., 2025-06-10 or '2025-06-10 18:30'), 'now', or relative (e.g., '2 hours ago', 'in 3 days')"
        );
    };

    let (number, unit, forward) = match (caps.get(1), caps.get(2)) {
        (Some(number), Some(unit)) => (number.as_str(), unit.as_str(), false),
        _ => (&caps[3], caps.get(4).map_or("", |m| m.as_str()), true),
    };

    let n: i64 = number
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match unit {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {unit}");
    }

    let duration = Duration::minutes(n * minutes_per_unit);
    Ok(if forward { now + duration } else { now - duration })
}

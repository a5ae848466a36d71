//! Helpers shared by the CLI commands.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Parse a `YYYY-MM-DD` flag as midnight UTC.
pub fn parse_date(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("--{} expects YYYY-MM-DD, got '{}'", flag, value))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Parse a `YYYY-MM-DD` flag as the last instant of that day, for inclusive
/// upper bounds.
pub fn parse_end_of_day(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    let start = parse_date(flag, value)?;
    Ok(start + Duration::days(1) - Duration::nanoseconds(1))
}

/// Shorten `s` to `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

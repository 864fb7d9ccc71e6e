//! Timestamp utilities

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Start of a trailing window of `days` days ending at `at`
pub fn window_start(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    at - Duration::days(days)
}

/// Whole days elapsed from `earlier` to `later` (floored, never negative)
pub fn whole_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_days().max(0)
}

/// Midnight UTC on the first day of `at`'s month
pub fn start_of_month(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(at.year(), at.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(at)
}

/// Midnight UTC on January 1st of `at`'s year
pub fn start_of_year(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(at.year(), 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(at)
}

/// Calendar date as stored in `habit_logs.date` (YYYY-MM-DD)
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse an RFC 3339 timestamp or a bare YYYY-MM-DD date (midnight UTC)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

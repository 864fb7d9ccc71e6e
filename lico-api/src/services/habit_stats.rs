//! Habit statistics over the trailing 30 days

use crate::db::habits::HabitLog;
use chrono::{Duration, NaiveDate};
use lico_common::time::date_key;
use serde::Serialize;

/// Days covered by completion rate and streak
pub const STATS_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    /// round(completed logs / 30 * 100)
    pub completion_rate: i64,
    /// Consecutive completed days ending today
    pub current_streak: i64,
    pub completed_today: bool,
}

/// First day (YYYY-MM-DD) of the stats window ending `today`
///
/// The window holds `STATS_WINDOW_DAYS` calendar days including today.
pub fn window_start_key(today: NaiveDate) -> String {
    date_key(today - Duration::days(STATS_WINDOW_DAYS - 1))
}

/// Compute stats from the logs of one habit
///
/// Logs outside the window are ignored. The streak stops at the first day
/// that has no log or an uncompleted one, starting from today.
pub fn compute_habit_stats(logs: &[HabitLog], today: NaiveDate) -> HabitStats {
    let start = window_start_key(today);
    let today_key = date_key(today);

    let completed = logs
        .iter()
        .filter(|l| l.completed && l.date >= start && l.date <= today_key)
        .count() as f64;
    let completion_rate = (completed / STATS_WINDOW_DAYS as f64 * 100.0).round() as i64;

    let is_completed = |key: &str| logs.iter().any(|l| l.date == key && l.completed);

    let mut current_streak = 0;
    for offset in 0..STATS_WINDOW_DAYS {
        if is_completed(&date_key(today - Duration::days(offset))) {
            current_streak += 1;
        } else {
            break;
        }
    }

    HabitStats {
        completion_rate,
        current_streak,
        completed_today: is_completed(&today_key),
    }
}

//! Five-field cron expressions for SCHEDULED_TIME triggers
//!
//! Fields: minute (0-59), hour (0-23), day of month (1-31), month (1-12),
//! day of week (0-6, Sunday = 0, 7 also accepted as Sunday). Each field is
//! `*` or a comma-separated list of `n`, `a-b`, `*/s` or `a-b/s`.
//!
//! As in classic cron, when both day-of-month and day-of-week are restricted
//! (neither starts with `*`) a time matches if either one does.

use chrono::{DateTime, Datelike, Timelike, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("Expected 5 fields, found {0}")]
    FieldCount(usize),

    #[error("Invalid {field} field '{value}'")]
    InvalidField { field: &'static str, value: String },
}

/// One parsed field as a bitmask of allowed values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Field {
    bits: u64,
    /// Field started with `*` (`*` or `*/s`)
    any: bool,
}

impl Field {
    fn contains(&self, value: u32) -> bool {
        self.bits & (1u64 << value) != 0
    }
}

/// Parsed cron schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::FieldCount(fields.len()));
        }

        let mut day_of_week = parse_field(fields[4], "day-of-week", 0, 7)?;
        // 7 is Sunday
        if day_of_week.contains(7) {
            day_of_week.bits = (day_of_week.bits & !(1u64 << 7)) | 1;
        }

        Ok(Self {
            minute: parse_field(fields[0], "minute", 0, 59)?,
            hour: parse_field(fields[1], "hour", 0, 23)?,
            day_of_month: parse_field(fields[2], "day-of-month", 1, 31)?,
            month: parse_field(fields[3], "month", 1, 12)?,
            day_of_week,
        })
    }

    /// Whether the minute containing `at` is scheduled
    pub fn matches(&self, at: DateTime<Utc>) -> bool {
        if !self.minute.contains(at.minute())
            || !self.hour.contains(at.hour())
            || !self.month.contains(at.month())
        {
            return false;
        }

        let dom = self.day_of_month.contains(at.day());
        let dow = self.day_of_week.contains(at.weekday().num_days_from_sunday());
        match (self.day_of_month.any, self.day_of_week.any) {
            (false, false) => dom || dow,
            _ => dom && dow,
        }
    }
}

fn parse_field(text: &str, field: &'static str, min: u32, max: u32) -> Result<Field, CronError> {
    let invalid = || CronError::InvalidField {
        field,
        value: text.to_string(),
    };

    let mut bits = 0u64;
    for part in text.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid())?;
                if step == 0 || step > max - min {
                    return Err(invalid());
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range == "*" {
            (min, max)
        } else if let Some((a, b)) = range.split_once('-') {
            (
                a.parse().map_err(|_| invalid())?,
                b.parse().map_err(|_| invalid())?,
            )
        } else {
            let value: u32 = range.parse().map_err(|_| invalid())?;
            // `n/s` means from n to the end of the field
            if step > 1 {
                (value, max)
            } else {
                (value, value)
            }
        };

        if start < min || end > max || start > end {
            return Err(invalid());
        }

        let mut value = start;
        while value <= end {
            bits |= 1u64 << value;
            value += step;
        }
    }

    Ok(Field {
        bits,
        any: text.starts_with('*'),
    })
}

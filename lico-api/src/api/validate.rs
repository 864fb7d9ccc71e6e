//! Request field validation shared by handlers

use chrono::{DateTime, Utc};
use lico_common::time::parse_timestamp;

use crate::error::{ApiError, ApiResult};

/// Trimmed text of 1..=max characters
pub fn required_text(field: &str, value: &str, max: usize) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Optional text; blank reads as absent
pub fn optional_text(field: &str, value: Option<String>, max: usize) -> ApiResult<Option<String>> {
    match value {
        Some(v) if !v.trim().is_empty() => required_text(field, &v, max).map(Some),
        _ => Ok(None),
    }
}

/// Integer within an inclusive range
pub fn in_range(field: &str, value: i64, min: i64, max: i64) -> ApiResult<i64> {
    if value < min || value > max {
        return Err(ApiError::BadRequest(format!(
            "{} must be between {} and {}",
            field, min, max
        )));
    }
    Ok(value)
}

/// Finite amount strictly above zero
pub fn positive_amount(field: &str, value: f64) -> ApiResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::BadRequest(format!("{} must be greater than 0", field)));
    }
    Ok(value)
}

/// One of a fixed set of lowercase labels (input is matched case-insensitively)
pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> ApiResult<String> {
    let value = value.trim().to_lowercase();
    if allowed.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!(
            "{} must be one of: {}",
            field,
            allowed.join(", ")
        )))
    }
}

/// RFC 3339 timestamp or YYYY-MM-DD date
pub fn timestamp(field: &str, value: &str) -> ApiResult<DateTime<Utc>> {
    parse_timestamp(value.trim())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is not a valid date", field)))
}

/// Optional timestamp; blank reads as absent
pub fn optional_timestamp(field: &str, value: Option<&str>) -> ApiResult<Option<DateTime<Utc>>> {
    match value {
        Some(v) if !v.trim().is_empty() => timestamp(field, v).map(Some),
        _ => Ok(None),
    }
}

/// Tags trimmed, blanks dropped
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

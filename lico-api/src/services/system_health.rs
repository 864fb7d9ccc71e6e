//! System health probe run by the cron route
//!
//! Measures database and LLM latency, stores each metric in
//! `system_health_logs` and, when something looks degraded, asks the LLM
//! for a short root-cause analysis.

use crate::db::system_health::{insert_health_log, HealthMetric, HealthStatus};
use crate::llm::TextGenerator;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Instant;
use tracing::{info, warn};

pub const DB_LATENCY: &str = "DB_LATENCY";
pub const LLM_LATENCY: &str = "LLM_LATENCY";

/// Reported when `SELECT 1` fails
const DB_FAILURE_MS: f64 = 1000.0;
/// Reported when the LLM endpoint is unreachable
const LLM_FAILURE_MS: f64 = 10_000.0;

/// Analysis stored when the LLM cannot explain a degradation
pub const ANALYSIS_FALLBACK: &str =
    "Automatic analysis unavailable. Check database load and the LLM endpoint.";

/// (warning above, critical above) in milliseconds
fn thresholds(metric: &str) -> (f64, f64) {
    match metric {
        DB_LATENCY => (100.0, 500.0),
        _ => (2000.0, 5000.0),
    }
}

/// Classify a latency sample
pub fn classify(metric: &str, value: f64) -> HealthStatus {
    let (warning, critical) = thresholds(metric);
    if value > critical {
        HealthStatus::Critical
    } else if value > warning {
        HealthStatus::Warning
    } else {
        HealthStatus::Normal
    }
}

fn metric(name: &str, value: f64, notes: Option<String>, at: DateTime<Utc>) -> HealthMetric {
    HealthMetric {
        metric: name.to_string(),
        value,
        status: classify(name, value),
        notes,
        created_at: at,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Worst metric status
    pub status: HealthStatus,
    pub metrics: Vec<HealthMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    pub timestamp: DateTime<Utc>,
}

async fn probe_database(pool: &SqlitePool, at: DateTime<Utc>) -> HealthMetric {
    let started = Instant::now();
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => metric(DB_LATENCY, started.elapsed().as_secs_f64() * 1000.0, None, at),
        Err(e) => {
            warn!("Database probe failed: {}", e);
            metric(DB_LATENCY, DB_FAILURE_MS, Some(e.to_string()), at)
        }
    }
}

async fn probe_llm(llm: &dyn TextGenerator, at: DateTime<Utc>) -> HealthMetric {
    let started = Instant::now();
    match llm.ping().await {
        Ok(()) => metric(LLM_LATENCY, started.elapsed().as_secs_f64() * 1000.0, None, at),
        Err(e) => {
            warn!("LLM probe failed: {}", e);
            metric(LLM_LATENCY, LLM_FAILURE_MS, Some(e.to_string()), at)
        }
    }
}

/// Probe, persist and (if degraded) analyze
pub async fn run_health_check(pool: &SqlitePool, llm: &dyn TextGenerator) -> Result<HealthReport> {
    let timestamp = Utc::now();
    let metrics = vec![probe_database(pool, timestamp).await, probe_llm(llm, timestamp).await];

    for m in &metrics {
        insert_health_log(pool, m).await?;
    }

    let status = metrics
        .iter()
        .map(|m| m.status)
        .max()
        .unwrap_or(HealthStatus::Normal);

    let analysis = if status > HealthStatus::Normal {
        Some(analyze(llm, &metrics).await)
    } else {
        None
    };

    info!(status = status.as_str(), "System health check completed");
    Ok(HealthReport {
        status,
        metrics,
        analysis,
        timestamp,
    })
}

async fn analyze(llm: &dyn TextGenerator, metrics: &[HealthMetric]) -> String {
    let lines = metrics
        .iter()
        .map(|m| format!("- {}: {:.1} ms ({})", m.metric, m.value, m.status.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "You are a site reliability assistant. The following service health metrics were just measured:\n{}\n\n\
         Give a brief likely root cause and one or two concrete remediation steps.",
        lines
    );

    match llm.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => ANALYSIS_FALLBACK.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(classify(DB_LATENCY, 100.0), HealthStatus::Normal);
        assert_eq!(classify(DB_LATENCY, 100.5), HealthStatus::Warning);
        assert_eq!(classify(DB_LATENCY, 501.0), HealthStatus::Critical);
        assert_eq!(classify(DB_LATENCY, DB_FAILURE_MS), HealthStatus::Critical);
        assert_eq!(classify(LLM_LATENCY, 1999.0), HealthStatus::Normal);
        assert_eq!(classify(LLM_LATENCY, 2500.0), HealthStatus::Warning);
        assert_eq!(classify(LLM_LATENCY, LLM_FAILURE_MS), HealthStatus::Critical);
    }
}

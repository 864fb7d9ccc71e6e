//! System health metric history

use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Metric status, worst wins when combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Normal,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Normal => "NORMAL",
            HealthStatus::Warning => "WARNING",
            HealthStatus::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetric {
    pub metric: String,
    pub value: f64,
    pub status: HealthStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_health_log(pool: &SqlitePool, metric: &HealthMetric) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO system_health_logs (guid, metric, value, status, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&metric.metric)
    .bind(metric.value)
    .bind(metric.status.as_str())
    .bind(&metric.notes)
    .bind(metric.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

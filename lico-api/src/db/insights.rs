//! Proactive insights

use super::get_guid;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// Insight category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InsightCategory {
    #[default]
    Wellness,
    Finance,
    Social,
    Growth,
}

/// Insight priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InsightPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::Wellness => "WELLNESS",
            InsightCategory::Finance => "FINANCE",
            InsightCategory::Social => "SOCIAL",
            InsightCategory::Growth => "GROWTH",
        }
    }

    /// Case-insensitive parse; None for unknown labels
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "WELLNESS" => Some(InsightCategory::Wellness),
            "FINANCE" => Some(InsightCategory::Finance),
            "SOCIAL" => Some(InsightCategory::Social),
            "GROWTH" => Some(InsightCategory::Growth),
            _ => None,
        }
    }
}

impl InsightPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightPriority::Low => "LOW",
            InsightPriority::Medium => "MEDIUM",
            InsightPriority::High => "HIGH",
        }
    }

    /// Case-insensitive parse; None for unknown labels
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(InsightPriority::Low),
            "MEDIUM" => Some(InsightPriority::Medium),
            "HIGH" => Some(InsightPriority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub category: InsightCategory,
    pub priority: InsightPriority,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct InsightFilter {
    pub category: Option<InsightCategory>,
    pub priority: Option<InsightPriority>,
    pub unread_only: bool,
}

fn insight_from_row(row: &SqliteRow) -> Result<Insight> {
    let category: String = row.try_get("category")?;
    let priority: String = row.try_get("priority")?;
    Ok(Insight {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        content: row.try_get("content")?,
        category: InsightCategory::parse(&category).unwrap_or_default(),
        priority: InsightPriority::parse(&priority).unwrap_or_default(),
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_insight(
    pool: &SqlitePool,
    user_id: Uuid,
    content: &str,
    category: InsightCategory,
    priority: InsightPriority,
) -> Result<Insight> {
    let insight = Insight {
        id: Uuid::new_v4(),
        user_id,
        content: content.to_string(),
        category,
        priority,
        is_read: false,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO proactive_insights (guid, user_id, content, category, priority, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(insight.id.to_string())
    .bind(user_id.to_string())
    .bind(&insight.content)
    .bind(category.as_str())
    .bind(priority.as_str())
    .bind(insight.created_at)
    .execute(pool)
    .await?;

    Ok(insight)
}

/// Most recent insights matching a filter
pub async fn list_insights(
    pool: &SqlitePool,
    user_id: Uuid,
    filter: &InsightFilter,
    limit: i64,
) -> Result<Vec<Insight>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT guid, user_id, content, category, priority, is_read, created_at FROM proactive_insights WHERE user_id = ",
    );
    qb.push_bind(user_id.to_string());
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority.as_str());
    }
    if filter.unread_only {
        qb.push(" AND is_read = 0");
    }
    qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(insight_from_row).collect()
}

pub async fn unread_count(pool: &SqlitePool, user_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM proactive_insights WHERE user_id = ? AND is_read = 0")
            .bind(user_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Mark the given insights read; ids owned by other users are ignored
pub async fn mark_read(pool: &SqlitePool, user_id: Uuid, ids: &[Uuid]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE proactive_insights SET is_read = 1 WHERE user_id = ");
    qb.push_bind(user_id.to_string());
    qb.push(" AND guid IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(")");

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn mark_all_read(pool: &SqlitePool, user_id: Uuid) -> Result<u64> {
    let result =
        sqlx::query("UPDATE proactive_insights SET is_read = 1 WHERE user_id = ? AND is_read = 0")
            .bind(user_id.to_string())
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

/// Timestamp of the user's newest insight
pub async fn latest_insight_at(pool: &SqlitePool, user_id: Uuid) -> Result<Option<DateTime<Utc>>> {
    let latest: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT created_at FROM proactive_insights WHERE user_id = ? ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(latest)
}

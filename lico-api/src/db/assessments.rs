//! Mental health self-assessments

use super::get_guid;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Questionnaire name as given by the client, e.g. "PHQ-9"
    #[serde(rename = "type")]
    pub assessment_type: String,
    /// Raw answers or subscale scores, stored as given
    pub scores: Value,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str = "guid, user_id, assessment_type, scores, summary, created_at";

fn assessment_from_row(row: &SqliteRow) -> Result<Assessment> {
    let scores: String = row.try_get("scores")?;
    Ok(Assessment {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        assessment_type: row.try_get("assessment_type")?,
        scores: serde_json::from_str(&scores)?,
        summary: row.try_get("summary")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_assessment(
    pool: &SqlitePool,
    user_id: Uuid,
    assessment_type: &str,
    scores: Value,
) -> Result<Assessment> {
    let assessment = Assessment {
        id: Uuid::new_v4(),
        user_id,
        assessment_type: assessment_type.to_string(),
        scores,
        summary: None,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO assessments (guid, user_id, assessment_type, scores, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(assessment.id.to_string())
    .bind(user_id.to_string())
    .bind(&assessment.assessment_type)
    .bind(serde_json::to_string(&assessment.scores)?)
    .bind(assessment.created_at)
    .execute(pool)
    .await?;

    Ok(assessment)
}

pub async fn set_summary(pool: &SqlitePool, id: Uuid, summary: &str) -> Result<()> {
    sqlx::query("UPDATE assessments SET summary = ? WHERE guid = ?")
        .bind(summary)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, user_id: Uuid, assessment_type: Option<&str>) {
    qb.push(" WHERE user_id = ").push_bind(user_id.to_string());
    if let Some(kind) = assessment_type {
        qb.push(" AND assessment_type = ").push_bind(kind.to_string());
    }
}

pub async fn count_assessments(
    pool: &SqlitePool,
    user_id: Uuid,
    assessment_type: Option<&str>,
) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM assessments");
    push_filter(&mut qb, user_id, assessment_type);
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Page of assessments, newest first, optionally of one type
pub async fn list_assessments(
    pool: &SqlitePool,
    user_id: Uuid,
    assessment_type: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Assessment>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM assessments", COLUMNS));
    push_filter(&mut qb, user_id, assessment_type);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(assessment_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_pool, test_user};
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_list_and_filter_by_type() {
        let (_dir, pool) = test_pool().await;
        let user = test_user(&pool, "a@example.com").await;
        let other = test_user(&pool, "b@example.com").await;

        insert_assessment(&pool, user, "PHQ-9", json!({"total": 7})).await.unwrap();
        let gad = insert_assessment(&pool, user, "GAD-7", json!([1, 0, 2])).await.unwrap();
        insert_assessment(&pool, other, "PHQ-9", json!({"total": 3})).await.unwrap();

        set_summary(&pool, gad.id, "Mild anxiety this week.").await.unwrap();

        assert_eq!(count_assessments(&pool, user, None).await.unwrap(), 2);
        assert_eq!(count_assessments(&pool, user, Some("PHQ-9")).await.unwrap(), 1);

        let listed = list_assessments(&pool, user, Some("GAD-7"), 10, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].scores, json!([1, 0, 2]));
        assert_eq!(listed[0].summary.as_deref(), Some("Mild anxiety this week."));

        let page = list_assessments(&pool, user, None, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
    }
}

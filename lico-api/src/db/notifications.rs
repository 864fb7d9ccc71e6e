//! User notifications written by automation actions

use super::get_guid;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub priority: String,
    /// Producer tag, e.g. `automation`, `journal_prompt`, `habit_reminder`
    pub source: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

fn notification_from_row(row: &SqliteRow) -> Result<Notification> {
    Ok(Notification {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        message: row.try_get("message")?,
        priority: row.try_get("priority")?,
        source: row.try_get("source")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_notification(
    pool: &SqlitePool,
    user_id: Uuid,
    message: &str,
    priority: &str,
    source: &str,
) -> Result<Notification> {
    let notification = Notification {
        id: Uuid::new_v4(),
        user_id,
        message: message.to_string(),
        priority: priority.to_string(),
        source: source.to_string(),
        is_read: false,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO notifications (guid, user_id, message, priority, source, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(notification.id.to_string())
    .bind(user_id.to_string())
    .bind(&notification.message)
    .bind(&notification.priority)
    .bind(&notification.source)
    .bind(notification.created_at)
    .execute(pool)
    .await?;

    Ok(notification)
}

/// Newest notifications first
pub async fn list_notifications(pool: &SqlitePool, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, user_id, message, priority, source, is_read, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(notification_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_pool, test_user};

    #[tokio::test]
    async fn test_notifications_scoped_to_user() {
        let (_dir, pool) = test_pool().await;
        let alice = test_user(&pool, "alice@example.com").await;
        let bob = test_user(&pool, "bob@example.com").await;

        insert_notification(&pool, alice, "Time to journal", "normal", "journal_prompt")
            .await
            .unwrap();

        let mine = list_notifications(&pool, alice, 50).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].source, "journal_prompt");
        assert!(!mine[0].is_read);
        assert!(list_notifications(&pool, bob, 50).await.unwrap().is_empty());
    }
}

//! Habits and daily habit logs

use super::get_guid;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// daily, weekly or monthly
    pub frequency: String,
    pub goal: Option<i64>,
    /// Consecutive completed days ending today, refreshed on every log
    pub streak: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitLog {
    pub id: Uuid,
    pub habit_id: Uuid,
    /// YYYY-MM-DD
    pub date: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

const HABIT_COLUMNS: &str =
    "guid, user_id, name, description, frequency, goal, streak, created_at, updated_at";

fn habit_from_row(row: &SqliteRow) -> Result<Habit> {
    Ok(Habit {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        frequency: row.try_get("frequency")?,
        goal: row.try_get("goal")?,
        streak: row.try_get("streak")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn log_from_row(row: &SqliteRow) -> Result<HabitLog> {
    Ok(HabitLog {
        id: get_guid(row, "guid")?,
        habit_id: get_guid(row, "habit_id")?,
        date: row.try_get("date")?,
        completed: row.try_get("completed")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_habit(
    pool: &SqlitePool,
    user_id: Uuid,
    name: &str,
    description: Option<String>,
    frequency: &str,
    goal: Option<i64>,
) -> Result<Habit> {
    let now = Utc::now();
    let habit = Habit {
        id: Uuid::new_v4(),
        user_id,
        name: name.to_string(),
        description,
        frequency: frequency.to_string(),
        goal,
        streak: 0,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO habits (guid, user_id, name, description, frequency, goal, streak, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(habit.id.to_string())
    .bind(user_id.to_string())
    .bind(&habit.name)
    .bind(&habit.description)
    .bind(&habit.frequency)
    .bind(habit.goal)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(habit)
}

pub async fn list_habits(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Habit>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM habits WHERE user_id = ? ORDER BY created_at DESC",
        HABIT_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(habit_from_row).collect()
}

pub async fn get_habit(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<Habit>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM habits WHERE guid = ? AND user_id = ?",
        HABIT_COLUMNS
    ))
    .bind(id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(habit_from_row).transpose()
}

/// Delete a habit and (by cascade) its logs
pub async fn delete_habit(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM habits WHERE guid = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Habits touched (created or logged) since `since`
pub async fn habits_updated_since(
    pool: &SqlitePool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<Habit>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM habits WHERE user_id = ? AND updated_at >= ?",
        HABIT_COLUMNS
    ))
    .bind(user_id.to_string())
    .bind(since)
    .fetch_all(pool)
    .await?;

    rows.iter().map(habit_from_row).collect()
}

/// Record a habit for a day; a second log for the same day replaces the first
pub async fn upsert_log(
    pool: &SqlitePool,
    habit_id: Uuid,
    date: &str,
    completed: bool,
    notes: Option<String>,
) -> Result<HabitLog> {
    sqlx::query(
        r#"
        INSERT INTO habit_logs (guid, habit_id, date, completed, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(habit_id, date) DO UPDATE SET
            completed = excluded.completed,
            notes = excluded.notes
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(habit_id.to_string())
    .bind(date)
    .bind(completed)
    .bind(&notes)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let row = sqlx::query(
        "SELECT guid, habit_id, date, completed, notes, created_at FROM habit_logs WHERE habit_id = ? AND date = ?",
    )
    .bind(habit_id.to_string())
    .bind(date)
    .fetch_one(pool)
    .await?;

    log_from_row(&row)
}

/// Logs dated on or after `since_date` (YYYY-MM-DD), newest first
pub async fn logs_since(pool: &SqlitePool, habit_id: Uuid, since_date: &str) -> Result<Vec<HabitLog>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, habit_id, date, completed, notes, created_at
        FROM habit_logs
        WHERE habit_id = ? AND date >= ?
        ORDER BY date DESC
        "#,
    )
    .bind(habit_id.to_string())
    .bind(since_date)
    .fetch_all(pool)
    .await?;

    rows.iter().map(log_from_row).collect()
}

/// Store a recomputed streak and mark the habit as touched
pub async fn set_streak(pool: &SqlitePool, habit_id: Uuid, streak: i64) -> Result<()> {
    sqlx::query("UPDATE habits SET streak = ?, updated_at = ? WHERE guid = ?")
        .bind(streak)
        .bind(Utc::now())
        .bind(habit_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_pool, test_user};

    #[tokio::test]
    async fn test_second_log_same_day_updates() {
        let (_dir, pool) = test_pool().await;
        let user = test_user(&pool, "h@example.com").await;
        let habit = insert_habit(&pool, user, "Stretch", None, "daily", None)
            .await
            .unwrap();

        let first = upsert_log(&pool, habit.id, "2026-03-01", true, None).await.unwrap();
        let second = upsert_log(&pool, habit.id, "2026-03-01", false, Some("skipped".into()))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(!second.completed);
        assert_eq!(second.notes.as_deref(), Some("skipped"));

        let logs = logs_since(&pool, habit.id, "2026-01-01").await.unwrap();
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn test_logs_since_orders_newest_first() {
        let (_dir, pool) = test_pool().await;
        let user = test_user(&pool, "h2@example.com").await;
        let habit = insert_habit(&pool, user, "Read", None, "daily", Some(30))
            .await
            .unwrap();

        for date in ["2026-03-01", "2026-03-03", "2026-02-01"] {
            upsert_log(&pool, habit.id, date, true, None).await.unwrap();
        }

        let logs = logs_since(&pool, habit.id, "2026-02-15").await.unwrap();
        let dates: Vec<_> = logs.iter().map(|l| l.date.as_str()).collect();
        assert_eq!(dates, vec!["2026-03-03", "2026-03-01"]);
    }

    #[tokio::test]
    async fn test_delete_cascades_logs() {
        let (_dir, pool) = test_pool().await;
        let user = test_user(&pool, "h3@example.com").await;
        let habit = insert_habit(&pool, user, "Walk", None, "daily", None)
            .await
            .unwrap();
        upsert_log(&pool, habit.id, "2026-03-01", true, None).await.unwrap();

        assert!(delete_habit(&pool, user, habit.id).await.unwrap());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM habit_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}

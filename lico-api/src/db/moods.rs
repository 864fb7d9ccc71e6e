//! Mood entries

use super::{get_guid, tags_from_json, tags_to_json};
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// 1-10
    pub mood: i64,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub ai_insight: Option<String>,
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str = "guid, user_id, mood, notes, tags, ai_insight, created_at";

fn mood_from_row(row: &SqliteRow) -> Result<MoodEntry> {
    let tags: String = row.try_get("tags")?;
    Ok(MoodEntry {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        mood: row.try_get("mood")?,
        notes: row.try_get("notes")?,
        tags: tags_from_json(&tags),
        ai_insight: row.try_get("ai_insight")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_mood(
    pool: &SqlitePool,
    user_id: Uuid,
    mood: i64,
    notes: Option<String>,
    tags: Vec<String>,
) -> Result<MoodEntry> {
    let entry = MoodEntry {
        id: Uuid::new_v4(),
        user_id,
        mood,
        notes,
        tags,
        ai_insight: None,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO mood_entries (guid, user_id, mood, notes, tags, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.id.to_string())
    .bind(user_id.to_string())
    .bind(entry.mood)
    .bind(&entry.notes)
    .bind(tags_to_json(&entry.tags)?)
    .bind(entry.created_at)
    .execute(pool)
    .await?;

    Ok(entry)
}

/// Attach a generated supportive message to an entry
pub async fn set_ai_insight(pool: &SqlitePool, id: Uuid, insight: &str) -> Result<()> {
    sqlx::query("UPDATE mood_entries SET ai_insight = ? WHERE guid = ?")
        .bind(insight)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_moods(pool: &SqlitePool, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mood_entries WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Page of entries, newest first
pub async fn list_moods(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<MoodEntry>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM mood_entries WHERE user_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(user_id.to_string())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(mood_from_row).collect()
}

/// Entries since `since`, newest first
pub async fn moods_since(
    pool: &SqlitePool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<MoodEntry>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM mood_entries WHERE user_id = ? AND created_at >= ? ORDER BY created_at DESC",
        COLUMNS
    ))
    .bind(user_id.to_string())
    .bind(since)
    .fetch_all(pool)
    .await?;

    rows.iter().map(mood_from_row).collect()
}

//! Journal entries

use super::{get_guid, tags_from_json, tags_to_json};
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub mood: Option<i64>,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied on create
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub title: String,
    pub content: String,
    pub mood: Option<i64>,
    pub tags: Vec<String>,
    pub is_private: bool,
}

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct JournalUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    /// Substring of title or content
    pub search: Option<String>,
    pub mood: Option<i64>,
    /// Exact tag membership
    pub tag: Option<String>,
}

const COLUMNS: &str =
    "guid, user_id, title, content, mood, tags, is_private, created_at, updated_at";

fn entry_from_row(row: &SqliteRow) -> Result<JournalEntry> {
    let tags: String = row.try_get("tags")?;
    Ok(JournalEntry {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        mood: row.try_get("mood")?,
        tags: tags_from_json(&tags),
        is_private: row.try_get("is_private")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, user_id: Uuid, filter: &JournalFilter) {
    qb.push(" WHERE user_id = ").push_bind(user_id.to_string());

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR content LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(mood) = filter.mood {
        qb.push(" AND mood = ").push_bind(mood);
    }
    if let Some(tag) = filter.tag.as_deref().filter(|t| !t.is_empty()) {
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(journal_entries.tags) WHERE json_each.value = ")
            .push_bind(tag.to_string())
            .push(")");
    }
}

pub async fn insert_entry(
    pool: &SqlitePool,
    user_id: Uuid,
    new: &NewJournalEntry,
) -> Result<JournalEntry> {
    let now = Utc::now();
    let entry = JournalEntry {
        id: Uuid::new_v4(),
        user_id,
        title: new.title.clone(),
        content: new.content.clone(),
        mood: new.mood,
        tags: new.tags.clone(),
        is_private: new.is_private,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO journal_entries (guid, user_id, title, content, mood, tags, is_private, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(user_id.to_string())
    .bind(&entry.title)
    .bind(&entry.content)
    .bind(entry.mood)
    .bind(tags_to_json(&entry.tags)?)
    .bind(entry.is_private)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(entry)
}

/// Count entries matching a filter
pub async fn count_entries(pool: &SqlitePool, user_id: Uuid, filter: &JournalFilter) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM journal_entries");
    push_filter(&mut qb, user_id, filter);
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Page of entries matching a filter, newest first
pub async fn list_entries(
    pool: &SqlitePool,
    user_id: Uuid,
    filter: &JournalFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<JournalEntry>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM journal_entries", COLUMNS));
    push_filter(&mut qb, user_id, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(entry_from_row).collect()
}

pub async fn get_entry(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<JournalEntry>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM journal_entries WHERE guid = ? AND user_id = ?",
        COLUMNS
    ))
    .bind(id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(entry_from_row).transpose()
}

/// Apply a partial update; None when the entry is missing or foreign
pub async fn update_entry(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
    update: &JournalUpdate,
) -> Result<Option<JournalEntry>> {
    let Some(mut entry) = get_entry(pool, user_id, id).await? else {
        return Ok(None);
    };

    if let Some(title) = &update.title {
        entry.title = title.clone();
    }
    if let Some(content) = &update.content {
        entry.content = content.clone();
    }
    if update.mood.is_some() {
        entry.mood = update.mood;
    }
    if let Some(tags) = &update.tags {
        entry.tags = tags.clone();
    }
    if let Some(is_private) = update.is_private {
        entry.is_private = is_private;
    }
    entry.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE journal_entries
        SET title = ?, content = ?, mood = ?, tags = ?, is_private = ?, updated_at = ?
        WHERE guid = ? AND user_id = ?
        "#,
    )
    .bind(&entry.title)
    .bind(&entry.content)
    .bind(entry.mood)
    .bind(tags_to_json(&entry.tags)?)
    .bind(entry.is_private)
    .bind(entry.updated_at)
    .bind(id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    Ok(Some(entry))
}

/// Delete an entry; returns whether anything was removed
pub async fn delete_entry(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM journal_entries WHERE guid = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Number of entries written since `since`
pub async fn count_since(pool: &SqlitePool, user_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM journal_entries WHERE user_id = ? AND created_at >= ?")
            .bind(user_id.to_string())
            .bind(since)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

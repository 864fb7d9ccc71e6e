//! Communities, memberships, posts, events and RSVPs

use super::get_guid;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    /// owner or member
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityEvent {
    pub id: Uuid,
    pub community_id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub going_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCommunityEvent {
    pub community_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    pub event_id: Uuid,
    pub user_id: Uuid,
    /// going, maybe or declined
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

const COMMUNITY_SELECT: &str = r#"
    SELECT c.guid, c.owner_id, c.name, c.description, c.category, c.created_at,
           (SELECT COUNT(*) FROM community_memberships m WHERE m.community_id = c.guid) AS member_count
    FROM communities c
"#;

const EVENT_SELECT: &str = r#"
    SELECT e.guid, e.community_id, e.organizer_id, e.title, e.description, e.starts_at,
           e.location, e.created_at,
           (SELECT COUNT(*) FROM event_rsvps r WHERE r.event_id = e.guid AND r.status = 'going') AS going_count
    FROM community_events e
"#;

fn community_from_row(row: &SqliteRow) -> Result<Community> {
    Ok(Community {
        id: get_guid(row, "guid")?,
        owner_id: get_guid(row, "owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        member_count: row.try_get("member_count")?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<CommunityPost> {
    Ok(CommunityPost {
        id: get_guid(row, "guid")?,
        community_id: get_guid(row, "community_id")?,
        user_id: get_guid(row, "user_id")?,
        author_name: row.try_get("author_name")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

fn event_from_row(row: &SqliteRow) -> Result<CommunityEvent> {
    Ok(CommunityEvent {
        id: get_guid(row, "guid")?,
        community_id: get_guid(row, "community_id")?,
        organizer_id: get_guid(row, "organizer_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        starts_at: row.try_get("starts_at")?,
        location: row.try_get("location")?,
        going_count: row.try_get("going_count")?,
        created_at: row.try_get("created_at")?,
    })
}

// ========================================
// Communities and membership
// ========================================

/// Create a community with its creator as owner, in one transaction
pub async fn insert_community(
    pool: &SqlitePool,
    owner_id: Uuid,
    name: &str,
    description: Option<String>,
    category: Option<String>,
) -> Result<Community> {
    let now = Utc::now();
    let community = Community {
        id: Uuid::new_v4(),
        owner_id,
        name: name.to_string(),
        description,
        category,
        member_count: 1,
        created_at: now,
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO communities (guid, owner_id, name, description, category, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(community.id.to_string())
    .bind(owner_id.to_string())
    .bind(&community.name)
    .bind(&community.description)
    .bind(&community.category)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO community_memberships (guid, community_id, user_id, role, joined_at) VALUES (?, ?, ?, 'owner', ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(community.id.to_string())
    .bind(owner_id.to_string())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(community)
}

/// All communities, optionally restricted to a category
pub async fn list_communities(pool: &SqlitePool, category: Option<&str>) -> Result<Vec<Community>> {
    let rows = match category {
        Some(category) => {
            sqlx::query(&format!("{} WHERE c.category = ? ORDER BY c.name ASC", COMMUNITY_SELECT))
                .bind(category)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query(&format!("{} ORDER BY c.name ASC", COMMUNITY_SELECT))
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(community_from_row).collect()
}

pub async fn get_community(pool: &SqlitePool, id: Uuid) -> Result<Option<Community>> {
    let row = sqlx::query(&format!("{} WHERE c.guid = ?", COMMUNITY_SELECT))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(community_from_row).transpose()
}

/// Join a community; a second join violates UNIQUE(community_id, user_id)
pub async fn join_community(pool: &SqlitePool, community_id: Uuid, user_id: Uuid) -> Result<Membership> {
    let membership = Membership {
        id: Uuid::new_v4(),
        community_id,
        user_id,
        role: "member".to_string(),
        joined_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO community_memberships (guid, community_id, user_id, role, joined_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(membership.id.to_string())
    .bind(community_id.to_string())
    .bind(user_id.to_string())
    .bind(&membership.role)
    .bind(membership.joined_at)
    .execute(pool)
    .await?;

    Ok(membership)
}

/// Leave a community; returns whether a membership was removed
pub async fn leave_community(pool: &SqlitePool, community_id: Uuid, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM community_memberships WHERE community_id = ? AND user_id = ?")
        .bind(community_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Role of a user in a community, None when not a member
pub async fn membership_role(
    pool: &SqlitePool,
    community_id: Uuid,
    user_id: Uuid,
) -> Result<Option<String>> {
    let role: Option<String> = sqlx::query_scalar(
        "SELECT role FROM community_memberships WHERE community_id = ? AND user_id = ?",
    )
    .bind(community_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(role)
}

// ========================================
// Posts
// ========================================

pub async fn insert_post(
    pool: &SqlitePool,
    community_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<CommunityPost> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO community_posts (guid, community_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(community_id.to_string())
    .bind(user_id.to_string())
    .bind(content)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let row = sqlx::query(
        r#"
        SELECT p.guid, p.community_id, p.user_id, u.name AS author_name, p.content, p.created_at
        FROM community_posts p JOIN users u ON u.guid = p.user_id
        WHERE p.guid = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_one(pool)
    .await?;

    post_from_row(&row)
}

pub async fn count_posts(pool: &SqlitePool, community_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM community_posts WHERE community_id = ?")
        .bind(community_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Page of a community's posts, newest first
pub async fn list_posts(
    pool: &SqlitePool,
    community_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommunityPost>> {
    let rows = sqlx::query(
        r#"
        SELECT p.guid, p.community_id, p.user_id, u.name AS author_name, p.content, p.created_at
        FROM community_posts p JOIN users u ON u.guid = p.user_id
        WHERE p.community_id = ?
        ORDER BY p.created_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(community_id.to_string())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(post_from_row).collect()
}

/// Posts authored by a user since `since`
pub async fn count_posts_by_user_since(
    pool: &SqlitePool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM community_posts WHERE user_id = ? AND created_at >= ?",
    )
    .bind(user_id.to_string())
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

// ========================================
// Events and RSVPs
// ========================================

pub async fn insert_event(
    pool: &SqlitePool,
    organizer_id: Uuid,
    new: &NewCommunityEvent,
) -> Result<CommunityEvent> {
    let event = CommunityEvent {
        id: Uuid::new_v4(),
        community_id: new.community_id,
        organizer_id,
        title: new.title.clone(),
        description: new.description.clone(),
        starts_at: new.starts_at,
        location: new.location.clone(),
        going_count: 0,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO community_events (guid, community_id, organizer_id, title, description, starts_at, location, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.id.to_string())
    .bind(event.community_id.to_string())
    .bind(organizer_id.to_string())
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.starts_at)
    .bind(&event.location)
    .bind(event.created_at)
    .execute(pool)
    .await?;

    Ok(event)
}

/// Events starting at or after `from`, soonest first
pub async fn list_upcoming_events(
    pool: &SqlitePool,
    community_id: Option<Uuid>,
    from: DateTime<Utc>,
) -> Result<Vec<CommunityEvent>> {
    let rows = match community_id {
        Some(community_id) => {
            sqlx::query(&format!(
                "{} WHERE e.starts_at >= ? AND e.community_id = ? ORDER BY e.starts_at ASC",
                EVENT_SELECT
            ))
            .bind(from)
            .bind(community_id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("{} WHERE e.starts_at >= ? ORDER BY e.starts_at ASC", EVENT_SELECT))
                .bind(from)
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(event_from_row).collect()
}

pub async fn get_event(pool: &SqlitePool, id: Uuid) -> Result<Option<CommunityEvent>> {
    let row = sqlx::query(&format!("{} WHERE e.guid = ?", EVENT_SELECT))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(event_from_row).transpose()
}

/// Set a user's RSVP; one row per user per event
pub async fn upsert_rsvp(pool: &SqlitePool, event_id: Uuid, user_id: Uuid, status: &str) -> Result<Rsvp> {
    let rsvp = Rsvp {
        event_id,
        user_id,
        status: status.to_string(),
        updated_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO event_rsvps (guid, event_id, user_id, status, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(event_id, user_id) DO UPDATE SET
            status = excluded.status,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(event_id.to_string())
    .bind(user_id.to_string())
    .bind(&rsvp.status)
    .bind(rsvp.updated_at)
    .execute(pool)
    .await?;

    Ok(rsvp)
}

//! Users and sessions

use super::get_guid;
use chrono::{DateTime, Duration, Utc};
use lico_common::auth::{generate_salt, generate_session_token, hash_password, hash_token};
use lico_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Registered user (never carries credentials)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Stored password material for login
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
    pub password_salt: String,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: get_guid(row, "guid")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Create a user with a freshly salted password hash
///
/// Emails are stored lowercased; a duplicate violates the UNIQUE constraint.
pub async fn create_user(pool: &SqlitePool, email: &str, name: &str, password: &str) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        email: email.trim().to_lowercase(),
        name: name.trim().to_string(),
        created_at: Utc::now(),
    };
    let salt = generate_salt();

    sqlx::query(
        r#"
        INSERT INTO users (guid, email, name, password_hash, password_salt, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.name)
    .bind(hash_password(password, &salt))
    .bind(&salt)
    .bind(user.created_at)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(user)
}

/// Load credentials for login
pub async fn find_credentials(pool: &SqlitePool, email: &str) -> Result<Option<Credentials>> {
    let row = sqlx::query(
        "SELECT guid, email, name, created_at, password_hash, password_salt FROM users WHERE email = ?",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(Credentials {
            user: user_from_row(&row)?,
            password_hash: row.try_get("password_hash")?,
            password_salt: row.try_get("password_salt")?,
        })),
        None => Ok(None),
    }
}

/// Create a session and return the bearer token (shown to the client once)
pub async fn create_session(
    pool: &SqlitePool,
    user_id: Uuid,
    ttl_hours: i64,
) -> Result<(String, DateTime<Utc>)> {
    let token = generate_session_token();
    let now = Utc::now();
    let expires_at = now + Duration::hours(ttl_hours);

    sqlx::query(
        r#"
        INSERT INTO sessions (guid, token_hash, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(hash_token(&token))
    .bind(user_id.to_string())
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;

    Ok((token, expires_at))
}

/// Resolve a bearer token to its user; expired sessions resolve to None
pub async fn find_user_by_session(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT u.guid, u.email, u.name, u.created_at
        FROM sessions s
        JOIN users u ON u.guid = s.user_id
        WHERE s.token_hash = ? AND s.expires_at > ?
        "#,
    )
    .bind(hash_token(token))
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Delete a session; returns whether it existed
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove sessions past their expiry
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Users with any mood, transaction, post or habit activity since `since`
pub async fn active_user_ids(pool: &SqlitePool, since: DateTime<Utc>) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        r#"
        SELECT user_id AS guid FROM mood_entries WHERE created_at >= ?1
        UNION
        SELECT user_id FROM transactions WHERE date >= ?1
        UNION
        SELECT user_id FROM community_posts WHERE created_at >= ?1
        UNION
        SELECT user_id FROM habits WHERE updated_at >= ?1
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    rows.iter().map(|row| get_guid(row, "guid")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    #[tokio::test]
    async fn test_create_user_normalizes_email() {
        let (_dir, pool) = test_pool().await;

        let user = create_user(&pool, "  Ana@Example.COM ", "Ana", "password123")
            .await
            .unwrap();
        assert_eq!(user.email, "ana@example.com");

        let creds = find_credentials(&pool, "ANA@example.com").await.unwrap().unwrap();
        assert_eq!(creds.user.id, user.id);
        assert!(lico_common::auth::verify_password(
            "password123",
            &creds.password_salt,
            &creds.password_hash
        ));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (_dir, pool) = test_pool().await;
        let user = create_user(&pool, "s@example.com", "S", "password123").await.unwrap();

        let (token, _) = create_session(&pool, user.id, 1).await.unwrap();
        let found = find_user_by_session(&pool, &token).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        assert!(delete_session(&pool, &token).await.unwrap());
        assert!(find_user_by_session(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_purged() {
        let (_dir, pool) = test_pool().await;
        let user = create_user(&pool, "e@example.com", "E", "password123").await.unwrap();

        let (token, _) = create_session(&pool, user.id, -1).await.unwrap();
        assert!(find_user_by_session(&pool, &token).await.unwrap().is_none());
        assert_eq!(purge_expired_sessions(&pool).await.unwrap(), 1);
    }
}

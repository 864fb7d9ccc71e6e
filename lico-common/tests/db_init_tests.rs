//! Database initialization tests
//!
//! Covers first-run creation, reopening an existing file, default settings,
//! and the uniqueness constraints the API relies on.

use lico_common::db::init_database;
use tempfile::TempDir;

async fn fresh_pool() -> (TempDir, sqlx::SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("lico.db")).await.unwrap();
    (dir, pool)
}

async fn insert_user(pool: &sqlx::SqlitePool, guid: &str, email: &str) {
    sqlx::query(
        "INSERT INTO users (guid, email, name, password_hash, password_salt, created_at, updated_at)
         VALUES (?, ?, 'Test', 'h', 's', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .bind(guid)
    .bind(email)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sub").join("lico.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_idempotent_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("lico.db");

    let pool1 = init_database(&db_path).await.unwrap();
    let count1: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await.unwrap();
    let count2: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool2)
        .await
        .unwrap();

    assert_eq!(count1, count2, "Reinitialization must not duplicate settings");
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let (_dir, pool) = fresh_pool().await;

    let timeout: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'database_busy_timeout_ms'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(timeout.as_deref(), Some("5000"));

    let last_check: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'last_wellness_check_at'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(last_check.as_deref(), Some(""));
}

#[tokio::test]
async fn test_null_setting_reset_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("lico.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'database_busy_timeout_ms'")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'database_busy_timeout_ms'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(value.as_deref(), Some("5000"));
}

#[tokio::test]
async fn test_all_tables_created() {
    let (_dir, pool) = fresh_pool().await;

    let expected = [
        "users",
        "sessions",
        "journal_entries",
        "mood_entries",
        "habits",
        "habit_logs",
        "transactions",
        "budgets",
        "financial_goals",
        "communities",
        "community_memberships",
        "community_posts",
        "community_events",
        "event_rsvps",
        "creative_projects",
        "generated_assets",
        "proactive_insights",
        "automation_routines",
        "automation_logs",
        "notifications",
        "system_health_logs",
        "settings",
    ];

    for table in expected {
        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(exists, 1, "table {} missing", table);
    }
}

#[tokio::test]
async fn test_user_email_unique() {
    let (_dir, pool) = fresh_pool().await;

    insert_user(&pool, "u1", "same@example.com").await;
    let second = sqlx::query(
        "INSERT INTO users (guid, email, name, password_hash, password_salt, created_at, updated_at)
         VALUES ('u2', 'same@example.com', 'Other', 'h', 's', 'x', 'x')",
    )
    .execute(&pool)
    .await;

    assert!(second.is_err(), "duplicate email must violate UNIQUE");
}

#[tokio::test]
async fn test_habit_log_unique_per_day() {
    let (_dir, pool) = fresh_pool().await;
    insert_user(&pool, "u1", "a@example.com").await;

    sqlx::query(
        "INSERT INTO habits (guid, user_id, name, frequency, created_at, updated_at)
         VALUES ('h1', 'u1', 'Walk', 'daily', 'x', 'x')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let log = "INSERT INTO habit_logs (guid, habit_id, date, completed, created_at)
               VALUES (?, 'h1', '2026-03-01', 1, 'x')";
    sqlx::query(log).bind("l1").execute(&pool).await.unwrap();
    let duplicate = sqlx::query(log).bind("l2").execute(&pool).await;

    assert!(duplicate.is_err(), "second log for the same day must be rejected");
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let (_dir, pool) = fresh_pool().await;

    let orphan = sqlx::query(
        "INSERT INTO mood_entries (guid, user_id, mood, created_at) VALUES ('m1', 'nobody', 5, 'x')",
    )
    .execute(&pool)
    .await;

    assert!(orphan.is_err(), "mood entry for a missing user must be rejected");
}

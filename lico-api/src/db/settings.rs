//! Key-value runtime settings

use lico_common::{Error, Result};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Setting key: RFC 3339 time of the last wellness cron run
pub const LAST_WELLNESS_CHECK_AT: &str = "last_wellness_check_at";

/// Setting key: RFC 3339 time of the last system health cron run
pub const LAST_SYSTEM_HEALTH_AT: &str = "last_system_health_at";

/// Generic setting getter
///
/// Returns None if the key is missing, NULL or empty.
pub async fn get_setting<T: FromStr>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match value.flatten() {
        Some(s) if !s.is_empty() => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        _ => Ok(None),
    }
}

/// Generic setting setter (insert or update)
pub async fn set_setting<T: ToString>(pool: &SqlitePool, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use chrono::{DateTime, Utc};

    #[tokio::test]
    async fn test_empty_default_reads_as_none() {
        let (_dir, pool) = test_pool().await;
        let value: Option<String> = get_setting(&pool, LAST_WELLNESS_CHECK_AT).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_timestamp_roundtrip() {
        let (_dir, pool) = test_pool().await;
        let at: DateTime<Utc> = "2026-03-01T10:00:00Z".parse().unwrap();
        set_setting(&pool, LAST_SYSTEM_HEALTH_AT, at.to_rfc3339()).await.unwrap();

        let loaded: Option<DateTime<Utc>> = get_setting(&pool, LAST_SYSTEM_HEALTH_AT).await.unwrap();
        assert_eq!(loaded, Some(at));
    }

    #[tokio::test]
    async fn test_unparseable_value_is_config_error() {
        let (_dir, pool) = test_pool().await;
        set_setting(&pool, "database_busy_timeout_ms", "soon").await.unwrap();

        let result: Result<Option<u64>> = get_setting(&pool, "database_busy_timeout_ms").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

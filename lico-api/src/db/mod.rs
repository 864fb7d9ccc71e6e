//! Database access layer
//!
//! One module per entity group. Every query on user-owned data filters by
//! `user_id`, so a record owned by someone else reads as missing.

pub mod assessments;
pub mod automations;
pub mod creative;
pub mod finance;
pub mod habits;
pub mod insights;
pub mod journal;
pub mod moods;
pub mod notifications;
pub mod settings;
pub mod social;
pub mod system_health;
pub mod users;

use lico_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Read a TEXT guid column as a Uuid
pub(crate) fn get_guid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.try_get(column)?;
    Uuid::parse_str(&value).map_err(|e| Error::CorruptRow {
        column: column.to_string(),
        detail: e.to_string(),
    })
}

/// Encode a tag list for a JSON TEXT column
pub(crate) fn tags_to_json(tags: &[String]) -> Result<String> {
    Ok(serde_json::to_string(tags)?)
}

/// Decode a JSON TEXT tag column; malformed content reads as no tags
pub(crate) fn tags_from_json(value: &str) -> Vec<String> {
    serde_json::from_str(value).unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use lico_common::db::init_database;
    use sqlx::SqlitePool;
    use tempfile::TempDir;
    use uuid::Uuid;

    /// Fresh file-backed database; keep the TempDir alive for the test
    pub async fn test_pool() -> (TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_database(&dir.path().join("test.db")).await.unwrap();
        (dir, pool)
    }

    pub async fn test_user(pool: &SqlitePool, email: &str) -> Uuid {
        super::users::create_user(pool, email, "Test User", "password123")
            .await
            .unwrap()
            .id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip_and_malformed() {
        let json = tags_to_json(&["a".to_string(), "b c".to_string()]).unwrap();
        assert_eq!(json, r#"["a","b c"]"#);
        assert_eq!(tags_from_json(&json), vec!["a", "b c"]);
        assert!(tags_from_json("not json").is_empty());
    }
}

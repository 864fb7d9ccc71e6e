//! Creative projects and their generated assets

use super::get_guid;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeProject {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// e.g. story, poem, music, art
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub asset_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAsset {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub asset_type: String,
    pub prompt: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

const PROJECT_SELECT: &str = r#"
    SELECT p.guid, p.user_id, p.title, p.kind, p.description, p.created_at, p.updated_at,
           (SELECT COUNT(*) FROM generated_assets a WHERE a.project_id = p.guid) AS asset_count
    FROM creative_projects p
"#;

fn project_from_row(row: &SqliteRow) -> Result<CreativeProject> {
    Ok(CreativeProject {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        title: row.try_get("title")?,
        kind: row.try_get("kind")?,
        description: row.try_get("description")?,
        asset_count: row.try_get("asset_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn asset_from_row(row: &SqliteRow) -> Result<GeneratedAsset> {
    Ok(GeneratedAsset {
        id: get_guid(row, "guid")?,
        project_id: get_guid(row, "project_id")?,
        user_id: get_guid(row, "user_id")?,
        asset_type: row.try_get("asset_type")?,
        prompt: row.try_get("prompt")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_project(
    pool: &SqlitePool,
    user_id: Uuid,
    title: &str,
    kind: &str,
    description: Option<String>,
) -> Result<CreativeProject> {
    let now = Utc::now();
    let project = CreativeProject {
        id: Uuid::new_v4(),
        user_id,
        title: title.to_string(),
        kind: kind.to_string(),
        description,
        asset_count: 0,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO creative_projects (guid, user_id, title, kind, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(project.id.to_string())
    .bind(user_id.to_string())
    .bind(&project.title)
    .bind(&project.kind)
    .bind(&project.description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(project)
}

pub async fn list_projects(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<CreativeProject>> {
    let rows = sqlx::query(&format!(
        "{} WHERE p.user_id = ? ORDER BY p.updated_at DESC",
        PROJECT_SELECT
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(project_from_row).collect()
}

pub async fn get_project(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<CreativeProject>> {
    let row = sqlx::query(&format!("{} WHERE p.guid = ? AND p.user_id = ?", PROJECT_SELECT))
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(project_from_row).transpose()
}

/// Delete a project and (by cascade) its assets
pub async fn delete_project(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM creative_projects WHERE guid = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Store a generated asset and bump the project's `updated_at`
pub async fn insert_asset(
    pool: &SqlitePool,
    project_id: Uuid,
    user_id: Uuid,
    asset_type: &str,
    prompt: &str,
    content: &str,
) -> Result<GeneratedAsset> {
    let asset = GeneratedAsset {
        id: Uuid::new_v4(),
        project_id,
        user_id,
        asset_type: asset_type.to_string(),
        prompt: prompt.to_string(),
        content: content.to_string(),
        created_at: Utc::now(),
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO generated_assets (guid, project_id, user_id, asset_type, prompt, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(asset.id.to_string())
    .bind(project_id.to_string())
    .bind(user_id.to_string())
    .bind(&asset.asset_type)
    .bind(&asset.prompt)
    .bind(&asset.content)
    .bind(asset.created_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE creative_projects SET updated_at = ? WHERE guid = ?")
        .bind(asset.created_at)
        .bind(project_id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(asset)
}

/// Assets of a project, newest first
pub async fn list_assets(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<GeneratedAsset>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, project_id, user_id, asset_type, prompt, content, created_at
        FROM generated_assets
        WHERE project_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(asset_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_pool, test_user};

    #[tokio::test]
    async fn test_asset_counted_and_cascaded() {
        let (_dir, pool) = test_pool().await;
        let user = test_user(&pool, "c@example.com").await;
        let project = insert_project(&pool, user, "Sea poems", "poem", None).await.unwrap();

        insert_asset(&pool, project.id, user, "text", "waves", "The tide returns")
            .await
            .unwrap();

        let loaded = get_project(&pool, user, project.id).await.unwrap().unwrap();
        assert_eq!(loaded.asset_count, 1);
        assert_eq!(list_assets(&pool, project.id).await.unwrap().len(), 1);

        assert!(delete_project(&pool, user, project.id).await.unwrap());
        assert!(list_assets(&pool, project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_project_hidden() {
        let (_dir, pool) = test_pool().await;
        let owner = test_user(&pool, "owner@example.com").await;
        let other = test_user(&pool, "other@example.com").await;
        let project = insert_project(&pool, owner, "Novel", "story", None).await.unwrap();

        assert!(get_project(&pool, other, project.id).await.unwrap().is_none());
        assert!(!delete_project(&pool, other, project.id).await.unwrap());
        assert!(list_projects(&pool, other).await.unwrap().is_empty());
    }
}

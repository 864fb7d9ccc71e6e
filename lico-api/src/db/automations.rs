//! Automation routines and their execution logs

use super::get_guid;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// One trigger or action of a routine: `{"type": "...", "params": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineStep {
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub params: Value,
}

impl RoutineStep {
    pub fn new(step_type: &str, params: Value) -> Self {
        Self {
            step_type: step_type.to_string(),
            params,
        }
    }

    /// String parameter, None when absent or not a string
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Numeric parameter; numeric strings are accepted too
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        match self.params.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub triggers: Vec<RoutineStep>,
    pub actions: Vec<RoutineStep>,
    pub is_enabled: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRoutine {
    pub name: String,
    pub description: Option<String>,
    pub triggers: Vec<RoutineStep>,
    pub actions: Vec<RoutineStep>,
    pub is_enabled: bool,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct RoutineUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub triggers: Option<Vec<RoutineStep>>,
    pub actions: Option<Vec<RoutineStep>>,
    pub is_enabled: Option<bool>,
}

/// Outcome of one executed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failed,
    Skipped,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Failed => "failed",
            LogStatus::Skipped => "skipped",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "success" => LogStatus::Success,
            "failed" => LogStatus::Failed,
            _ => LogStatus::Skipped,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationLog {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub user_id: Uuid,
    pub event_type: String,
    pub action_type: String,
    pub status: LogStatus,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

const ROUTINE_COLUMNS: &str =
    "guid, user_id, name, description, triggers, actions, is_enabled, last_run_at, created_at, updated_at";

fn steps_from_json(value: &str) -> Vec<RoutineStep> {
    serde_json::from_str(value).unwrap_or_default()
}

fn routine_from_row(row: &SqliteRow) -> Result<Routine> {
    let triggers: String = row.try_get("triggers")?;
    let actions: String = row.try_get("actions")?;
    Ok(Routine {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        triggers: steps_from_json(&triggers),
        actions: steps_from_json(&actions),
        is_enabled: row.try_get("is_enabled")?,
        last_run_at: row.try_get("last_run_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn log_from_row(row: &SqliteRow) -> Result<AutomationLog> {
    let status: String = row.try_get("status")?;
    Ok(AutomationLog {
        id: get_guid(row, "guid")?,
        routine_id: get_guid(row, "routine_id")?,
        user_id: get_guid(row, "user_id")?,
        event_type: row.try_get("event_type")?,
        action_type: row.try_get("action_type")?,
        status: LogStatus::parse(&status),
        detail: row.try_get("detail")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_routine(pool: &SqlitePool, user_id: Uuid, new: NewRoutine) -> Result<Routine> {
    let now = Utc::now();
    let routine = Routine {
        id: Uuid::new_v4(),
        user_id,
        name: new.name,
        description: new.description,
        triggers: new.triggers,
        actions: new.actions,
        is_enabled: new.is_enabled,
        last_run_at: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO automation_routines
            (guid, user_id, name, description, triggers, actions, is_enabled, last_run_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(routine.id.to_string())
    .bind(user_id.to_string())
    .bind(&routine.name)
    .bind(&routine.description)
    .bind(serde_json::to_string(&routine.triggers)?)
    .bind(serde_json::to_string(&routine.actions)?)
    .bind(routine.is_enabled)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(routine)
}

pub async fn list_routines(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Routine>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM automation_routines WHERE user_id = ? ORDER BY created_at DESC",
        ROUTINE_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(routine_from_row).collect()
}

pub async fn get_routine(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<Routine>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM automation_routines WHERE guid = ? AND user_id = ?",
        ROUTINE_COLUMNS
    ))
    .bind(id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(routine_from_row).transpose()
}

/// Apply a partial update; None when the routine is missing or foreign
pub async fn update_routine(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
    update: RoutineUpdate,
) -> Result<Option<Routine>> {
    let Some(mut routine) = get_routine(pool, user_id, id).await? else {
        return Ok(None);
    };

    if let Some(name) = update.name {
        routine.name = name;
    }
    if let Some(description) = update.description {
        routine.description = Some(description);
    }
    if let Some(triggers) = update.triggers {
        routine.triggers = triggers;
    }
    if let Some(actions) = update.actions {
        routine.actions = actions;
    }
    if let Some(is_enabled) = update.is_enabled {
        routine.is_enabled = is_enabled;
    }
    routine.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE automation_routines
        SET name = ?, description = ?, triggers = ?, actions = ?, is_enabled = ?, updated_at = ?
        WHERE guid = ? AND user_id = ?
        "#,
    )
    .bind(&routine.name)
    .bind(&routine.description)
    .bind(serde_json::to_string(&routine.triggers)?)
    .bind(serde_json::to_string(&routine.actions)?)
    .bind(routine.is_enabled)
    .bind(routine.updated_at)
    .bind(id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    Ok(Some(routine))
}

pub async fn delete_routine(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM automation_routines WHERE guid = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Enabled routines of one user (event-driven matching)
pub async fn enabled_routines_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Routine>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM automation_routines WHERE user_id = ? AND is_enabled = 1",
        ROUTINE_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(routine_from_row).collect()
}

/// Enabled routines of every user (scheduled pass)
pub async fn enabled_routines(pool: &SqlitePool) -> Result<Vec<Routine>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM automation_routines WHERE is_enabled = 1",
        ROUTINE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(routine_from_row).collect()
}

pub async fn set_last_run(pool: &SqlitePool, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE automation_routines SET last_run_at = ? WHERE guid = ?")
        .bind(at)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_log(
    pool: &SqlitePool,
    routine: &Routine,
    event_type: &str,
    action_type: &str,
    status: LogStatus,
    detail: Option<String>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO automation_logs (guid, routine_id, user_id, event_type, action_type, status, detail, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(routine.id.to_string())
    .bind(routine.user_id.to_string())
    .bind(event_type)
    .bind(action_type)
    .bind(status.as_str())
    .bind(&detail)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Execution history of one routine, newest first
pub async fn list_logs(
    pool: &SqlitePool,
    user_id: Uuid,
    routine_id: Uuid,
    limit: i64,
) -> Result<Vec<AutomationLog>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, routine_id, user_id, event_type, action_type, status, detail, created_at
        FROM automation_logs
        WHERE routine_id = ? AND user_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(routine_id.to_string())
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(log_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_pool, test_user};
    use serde_json::json;

    fn sample(name: &str) -> NewRoutine {
        NewRoutine {
            name: name.to_string(),
            description: None,
            triggers: vec![RoutineStep::new("JOURNAL_CREATED", json!({}))],
            actions: vec![RoutineStep::new(
                "SEND_NOTIFICATION",
                json!({"message": "Nice entry", "priority": "normal"}),
            )],
            is_enabled: true,
        }
    }

    #[test]
    fn test_step_params() {
        let step: RoutineStep =
            serde_json::from_str(r#"{"type":"TRANSACTION_CREATED","params":{"minAmount":"25.5","category":"food"}}"#)
                .unwrap();
        assert_eq!(step.step_type, "TRANSACTION_CREATED");
        assert_eq!(step.param_f64("minAmount"), Some(25.5));
        assert_eq!(step.param_str("category"), Some("food"));
        assert_eq!(step.param_str("missing"), None);

        let bare: RoutineStep = serde_json::from_str(r#"{"type":"JOURNAL_CREATED"}"#).unwrap();
        assert!(bare.params.is_null());
    }

    #[tokio::test]
    async fn test_steps_persist_and_update() {
        let (_dir, pool) = test_pool().await;
        let user = test_user(&pool, "r@example.com").await;
        let routine = insert_routine(&pool, user, sample("Evening")).await.unwrap();

        let loaded = get_routine(&pool, user, routine.id).await.unwrap().unwrap();
        assert_eq!(loaded.triggers, routine.triggers);
        assert_eq!(loaded.actions.len(), 1);

        let updated = update_routine(
            &pool,
            user,
            routine.id,
            RoutineUpdate {
                is_enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert!(!updated.is_enabled);
        assert_eq!(updated.name, "Evening");
        assert!(enabled_routines_for_user(&pool, user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_routine_untouchable() {
        let (_dir, pool) = test_pool().await;
        let owner = test_user(&pool, "o@example.com").await;
        let other = test_user(&pool, "x@example.com").await;
        let routine = insert_routine(&pool, owner, sample("Mine")).await.unwrap();

        assert!(update_routine(&pool, other, routine.id, RoutineUpdate::default())
            .await
            .unwrap()
            .is_none());
        assert!(!delete_routine(&pool, other, routine.id).await.unwrap());
        assert_eq!(enabled_routines(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_logs_listed_per_routine() {
        let (_dir, pool) = test_pool().await;
        let user = test_user(&pool, "l@example.com").await;
        let routine = insert_routine(&pool, user, sample("Logged")).await.unwrap();

        insert_log(&pool, &routine, "journal.created", "SEND_NOTIFICATION", LogStatus::Success, None)
            .await
            .unwrap();
        insert_log(&pool, &routine, "journal.created", "UNKNOWN", LogStatus::Skipped, Some("Unknown action".into()))
            .await
            .unwrap();

        let logs = list_logs(&pool, user, routine.id, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().any(|l| l.status == LogStatus::Skipped));

        set_last_run(&pool, routine.id, Utc::now()).await.unwrap();
        let loaded = get_routine(&pool, user, routine.id).await.unwrap().unwrap();
        assert!(loaded.last_run_at.is_some());
    }
}

//! Habit endpoints
//!
//! Listing attaches 30-day statistics to each habit. Logging a day upserts
//! the log (one per habit per day), refreshes the stored streak and emits
//! `habit.completed` or `habit.missed`.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use lico_common::events::AutomationEvent;
use lico_common::time::date_key;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiPath};
use super::validate::{one_of, optional_text, required_text};
use crate::db::habits::{self, Habit, HabitLog};
use crate::error::{ApiError, ApiResult};
use crate::services::habit_stats::{compute_habit_stats, window_start_key, HabitStats};
use crate::AppState;

const FREQUENCIES: &[&str] = &["daily", "weekly", "monthly"];

#[derive(Debug, Serialize)]
pub struct HabitWithStats {
    #[serde(flatten)]
    pub habit: Habit,
    #[serde(flatten)]
    pub stats: HabitStats,
}

#[derive(Debug, Serialize)]
pub struct HabitListResponse {
    pub habits: Vec<HabitWithStats>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub goal: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LogHabitRequest {
    /// YYYY-MM-DD, defaults to today (UTC)
    pub date: Option<String>,
    #[serde(default = "default_completed")]
    pub completed: bool,
    pub notes: Option<String>,
}

fn default_completed() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct HabitLogResponse {
    pub log: HabitLog,
    pub stats: HabitStats,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Habit not found".to_string())
}

async fn stats_for(pool: &SqlitePool, habit_id: Uuid, today: NaiveDate) -> ApiResult<HabitStats> {
    let logs = habits::logs_since(pool, habit_id, &window_start_key(today)).await?;
    Ok(compute_habit_stats(&logs, today))
}

/// GET /api/habits
pub async fn list_habits(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<HabitListResponse>> {
    let today = Utc::now().date_naive();
    let mut result = Vec::new();
    for habit in habits::list_habits(&state.db, session.user.id).await? {
        let stats = stats_for(&state.db, habit.id, today).await?;
        result.push(HabitWithStats { habit, stats });
    }
    Ok(Json(HabitListResponse { habits: result }))
}

/// POST /api/habits
pub async fn create_habit(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateHabitRequest>,
) -> ApiResult<(StatusCode, Json<Habit>)> {
    let name = required_text("name", &req.name, 100)?;
    let description = optional_text("description", req.description, 500)?;
    let frequency = one_of("frequency", req.frequency.as_deref().unwrap_or("daily"), FREQUENCIES)?;
    if let Some(goal) = req.goal {
        if goal < 1 {
            return Err(ApiError::BadRequest("goal must be at least 1".to_string()));
        }
    }

    let habit = habits::insert_habit(
        &state.db,
        session.user.id,
        &name,
        description,
        &frequency,
        req.goal,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(habit)))
}

/// DELETE /api/habits/:id
pub async fn delete_habit(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if habits::delete_habit(&state.db, session.user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// POST /api/habits/:id/logs
pub async fn log_habit(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<LogHabitRequest>,
) -> ApiResult<Json<HabitLogResponse>> {
    let habit = habits::get_habit(&state.db, session.user.id, id)
        .await?
        .ok_or_else(not_found)?;

    let today = Utc::now().date_naive();
    let date = match req.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest("date must be YYYY-MM-DD".to_string()))?,
        None => today,
    };
    if date > today {
        return Err(ApiError::BadRequest("date cannot be in the future".to_string()));
    }
    let notes = optional_text("notes", req.notes, 500)?;

    let log = habits::upsert_log(&state.db, habit.id, &date_key(date), req.completed, notes).await?;

    let stats = stats_for(&state.db, habit.id, today).await?;
    habits::set_streak(&state.db, habit.id, stats.current_streak).await?;

    let event = if log.completed {
        AutomationEvent::HabitCompleted {
            user_id: habit.user_id,
            habit_id: habit.id,
            habit_name: habit.name.clone(),
            date: log.date.clone(),
            timestamp: Utc::now(),
        }
    } else {
        AutomationEvent::HabitMissed {
            user_id: habit.user_id,
            habit_id: habit.id,
            habit_name: habit.name.clone(),
            date: log.date.clone(),
            timestamp: Utc::now(),
        }
    };
    state.event_bus.emit_lossy(event);

    Ok(Json(HabitLogResponse { log, stats }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/habits", get(list_habits).post(create_habit))
        .route("/api/habits/:id", delete(delete_habit))
        .route("/api/habits/:id/logs", post(log_habit))
}

//! Automation routine endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validate::{optional_text, required_text};
use crate::db::automations::{
    self, AutomationLog, NewRoutine, Routine, RoutineStep, RoutineUpdate,
};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::services::automation::{suggest_routine, validate_triggers, RoutineSuggestion};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RoutineListResponse {
    pub routines: Vec<Routine>,
}

#[derive(Debug, Serialize)]
pub struct LogListResponse {
    pub logs: Vec<AutomationLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoutineRequest {
    pub name: String,
    pub description: Option<String>,
    pub triggers: Vec<RoutineStep>,
    pub actions: Vec<RoutineStep>,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoutineRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub triggers: Option<Vec<RoutineStep>>,
    pub actions: Option<Vec<RoutineStep>>,
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub goal: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogListQuery {
    pub limit: Option<i64>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Automation routine not found".to_string())
}

fn check_steps(triggers: Option<&[RoutineStep]>, actions: Option<&[RoutineStep]>) -> ApiResult<()> {
    if let Some(triggers) = triggers {
        validate_triggers(triggers).map_err(ApiError::BadRequest)?;
    }
    if let Some(actions) = actions {
        if actions.is_empty() {
            return Err(ApiError::BadRequest(
                "At least one action is required".to_string(),
            ));
        }
    }
    Ok(())
}

/// GET /api/automations
pub async fn list_routines(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<RoutineListResponse>> {
    let routines = automations::list_routines(&state.db, session.user.id).await?;
    Ok(Json(RoutineListResponse { routines }))
}

/// POST /api/automations
pub async fn create_routine(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateRoutineRequest>,
) -> ApiResult<(StatusCode, Json<Routine>)> {
    let name = required_text("name", &req.name, 100)?;
    let description = optional_text("description", req.description, 1000)?;
    check_steps(Some(&req.triggers), Some(&req.actions))?;

    let routine = automations::insert_routine(
        &state.db,
        session.user.id,
        NewRoutine {
            name,
            description,
            triggers: req.triggers,
            actions: req.actions,
            is_enabled: req.is_enabled,
        },
    )
    .await?;

    info!(user_id = %session.user.id, routine_id = %routine.id, "Automation routine created");
    Ok((StatusCode::CREATED, Json(routine)))
}

/// PUT /api/automations/:id
pub async fn update_routine(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateRoutineRequest>,
) -> ApiResult<Json<Routine>> {
    check_steps(req.triggers.as_deref(), req.actions.as_deref())?;
    let update = RoutineUpdate {
        name: req
            .name
            .map(|n| required_text("name", &n, 100))
            .transpose()?,
        description: optional_text("description", req.description, 1000)?,
        triggers: req.triggers,
        actions: req.actions,
        is_enabled: req.is_enabled,
    };

    automations::update_routine(&state.db, session.user.id, id, update)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /api/automations/:id
pub async fn delete_routine(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if automations::delete_routine(&state.db, session.user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// GET /api/automations/:id/logs
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<LogListQuery>,
) -> ApiResult<Json<LogListResponse>> {
    automations::get_routine(&state.db, session.user.id, id)
        .await?
        .ok_or_else(not_found)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let logs = automations::list_logs(&state.db, session.user.id, id, limit).await?;
    Ok(Json(LogListResponse { logs }))
}

/// POST /api/automations/suggestions
///
/// Always answers with a usable routine; the suggestion is not stored.
pub async fn suggest(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SuggestionRequest>,
) -> ApiResult<Json<RoutineSuggestion>> {
    let goal = required_text("goal", &req.goal, 500)?;
    Ok(Json(suggest_routine(state.llm.as_ref(), &goal).await))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/automations", get(list_routines).post(create_routine))
        .route("/api/automations/suggestions", post(suggest))
        .route(
            "/api/automations/:id",
            put(update_routine).delete(delete_routine),
        )
        .route("/api/automations/:id/logs", get(list_logs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_steps() {
        let trigger = RoutineStep::new("JOURNAL_CREATED", json!({}));
        let action = RoutineStep::new("SEND_NOTIFICATION", json!({ "message": "hi" }));

        assert!(check_steps(Some(&[trigger.clone()]), Some(&[action.clone()])).is_ok());
        assert!(check_steps(Some(&[trigger]), Some(&[])).is_err());
        assert!(check_steps(Some(&[]), Some(&[action])).is_err());
        // partial updates leave absent lists alone
        assert!(check_steps(None, None).is_ok());

        let bad_cron = RoutineStep::new("SCHEDULED_TIME", json!({ "cron": "61 * * * *" }));
        assert!(check_steps(Some(&[bad_cron]), None).is_err());
    }
}

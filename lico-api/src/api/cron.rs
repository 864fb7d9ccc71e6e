//! Cron-triggered maintenance routes
//!
//! Called by an external scheduler with `Authorization: Bearer <cron_secret>`.
//! When no secret is configured every call is rejected.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::auth::bearer_token;
use crate::db::settings::{set_setting, LAST_SYSTEM_HEALTH_AT, LAST_WELLNESS_CHECK_AT};
use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::services::system_health::{run_health_check, HealthReport};
use crate::services::wellness::{run_wellness_check, WellnessRunSummary};
use crate::AppState;

/// Cron secret middleware
pub async fn require_cron_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state
        .config
        .cron_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            warn!("Cron call rejected: no cron secret configured");
            ApiError::Unauthorized("Cron secret not configured".to_string())
        })?;

    match bearer_token(request.headers()) {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthorized("Invalid cron secret".to_string())),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessCheckResponse {
    pub success: bool,
    pub wellness: WellnessRunSummary,
    /// Scheduled routines that ran in this pass
    pub scheduled_routines: usize,
    pub expired_sessions: u64,
    pub timestamp: DateTime<Utc>,
}

/// POST|GET /api/cron/wellness-check
///
/// Generates proactive insights, runs due scheduled routines and purges
/// expired sessions.
pub async fn wellness_check(State(state): State<AppState>) -> ApiResult<Json<WellnessCheckResponse>> {
    let now = Utc::now();

    let wellness = run_wellness_check(
        &state.db,
        state.llm.as_ref(),
        &state.event_bus,
        &state.config.insights,
        now,
    )
    .await?;
    let scheduled_routines = state.engine.process_scheduled(now).await?;
    let expired_sessions = users::purge_expired_sessions(&state.db).await?;

    set_setting(&state.db, LAST_WELLNESS_CHECK_AT, now.to_rfc3339()).await?;

    info!(
        insights = wellness.insights,
        scheduled_routines, expired_sessions, "Wellness cron completed"
    );
    Ok(Json(WellnessCheckResponse {
        success: true,
        wellness,
        scheduled_routines,
        expired_sessions,
        timestamp: now,
    }))
}

/// GET /api/cron/system-health
pub async fn system_health(State(state): State<AppState>) -> ApiResult<Json<HealthReport>> {
    let report = run_health_check(&state.db, state.llm.as_ref()).await?;
    set_setting(&state.db, LAST_SYSTEM_HEALTH_AT, report.timestamp.to_rfc3339()).await?;
    Ok(Json(report))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/cron/wellness-check",
            get(wellness_check).post(wellness_check),
        )
        .route("/api/cron/system-health", get(system_health))
}

//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::db::settings::{get_setting, LAST_SYSTEM_HEALTH_AT, LAST_WELLNESS_CHECK_AT};
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok", or "degraded" when the database does not answer
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub uptime_seconds: i64,
    pub database: String,
    pub llm_model: String,
    pub last_wellness_check_at: Option<DateTime<Utc>>,
    pub last_system_health_at: Option<DateTime<Utc>>,
}

/// GET /health
///
/// Does NOT require authentication.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Health check database probe failed: {}", e);
            false
        }
    };

    // Unparseable timestamps read as never-run
    let (last_wellness_check_at, last_system_health_at) = if database_ok {
        (
            get_setting::<DateTime<Utc>>(&state.db, LAST_WELLNESS_CHECK_AT)
                .await
                .ok()
                .flatten(),
            get_setting::<DateTime<Utc>>(&state.db, LAST_SYSTEM_HEALTH_AT)
                .await
                .ok()
                .flatten(),
        )
    } else {
        (None, None)
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database_ok { "ok" } else { "degraded" }.to_string(),
            module: "lico-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_hash: env!("GIT_HASH").to_string(),
            uptime_seconds: (Utc::now() - state.startup_time).num_seconds(),
            database: if database_ok { "ok" } else { "error" }.to_string(),
            llm_model: state.llm.model().to_string(),
            last_wellness_check_at,
            last_system_health_at,
        }),
    )
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

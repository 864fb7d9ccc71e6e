//! Notification feed written by automation routines

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};

use super::auth::AuthSession;
use super::extract::ApiQuery;
use crate::db::notifications::{self, Notification};
use crate::error::ApiResult;
use crate::pagination::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiQuery(query): ApiQuery<NotificationListQuery>,
) -> ApiResult<Json<NotificationListResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let notifications = notifications::list_notifications(&state.db, session.user.id, limit).await?;
    Ok(Json(NotificationListResponse { notifications }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/notifications", get(list_notifications))
}

//! Proactive insight endpoints

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiQuery};
use crate::db::insights::{self, Insight, InsightCategory, InsightFilter, InsightPriority};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightListQuery {
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub priority: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightListResponse {
    pub insights: Vec<Insight>,
    pub unread_count: i64,
}

/// Either a set of ids or every insight of the caller
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[serde(default)]
    pub insight_ids: Vec<Uuid>,
    #[serde(default)]
    pub mark_all_as_read: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

fn parse_label<T>(field: &str, value: Option<&str>, parse: fn(&str) -> Option<T>) -> ApiResult<Option<T>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse(v)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown {}: {}", field, v))),
        None => Ok(None),
    }
}

/// GET /api/insights
pub async fn list_insights(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiQuery(query): ApiQuery<InsightListQuery>,
) -> ApiResult<Json<InsightListResponse>> {
    let filter = InsightFilter {
        category: parse_label("category", query.category.as_deref(), InsightCategory::parse)?,
        priority: parse_label("priority", query.priority.as_deref(), InsightPriority::parse)?,
        unread_only: query.unread_only,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let (insights, unread_count) = tokio::try_join!(
        insights::list_insights(&state.db, session.user.id, &filter, limit),
        insights::unread_count(&state.db, session.user.id),
    )?;

    Ok(Json(InsightListResponse {
        insights,
        unread_count,
    }))
}

/// PATCH /api/insights
///
/// Ids that do not belong to the caller are ignored.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<MarkReadRequest>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = if req.mark_all_as_read {
        insights::mark_all_read(&state.db, session.user.id).await?
    } else if !req.insight_ids.is_empty() {
        insights::mark_read(&state.db, session.user.id, &req.insight_ids).await?
    } else {
        return Err(ApiError::BadRequest(
            "Provide insightIds or markAllAsRead".to_string(),
        ));
    };

    Ok(Json(MarkReadResponse { updated }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/insights", get(list_insights).patch(mark_read))
}

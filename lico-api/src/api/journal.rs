//! Journal entry endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use lico_common::events::AutomationEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validate::{clean_tags, in_range, required_text};
use crate::db::journal::{self, JournalEntry, JournalFilter, JournalUpdate, NewJournalEntry};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageQuery, Pagination};
use crate::AppState;

const TITLE_MAX: usize = 200;
const CONTENT_MAX: usize = 10_000;

#[derive(Debug, Default, Deserialize)]
pub struct JournalListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub mood: Option<i64>,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JournalListResponse {
    pub entries: Vec<JournalEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJournalRequest {
    pub title: String,
    pub content: String,
    pub mood: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJournalRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Journal entry not found".to_string())
}

/// GET /api/journal
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiQuery(query): ApiQuery<JournalListQuery>,
) -> ApiResult<Json<JournalListResponse>> {
    let filter = JournalFilter {
        search: query.search,
        mood: query.mood,
        tag: query.tag,
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let total = journal::count_entries(&state.db, session.user.id, &filter).await?;
    let pagination = page.paginate(total);
    let entries = journal::list_entries(
        &state.db,
        session.user.id,
        &filter,
        pagination.limit,
        pagination.offset,
    )
    .await?;

    Ok(Json(JournalListResponse {
        entries,
        pagination,
    }))
}

/// POST /api/journal
///
/// Emits `journal.created`.
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateJournalRequest>,
) -> ApiResult<(StatusCode, Json<JournalEntry>)> {
    let new = NewJournalEntry {
        title: required_text("title", &req.title, TITLE_MAX)?,
        content: required_text("content", &req.content, CONTENT_MAX)?,
        mood: req.mood.map(|m| in_range("mood", m, 1, 10)).transpose()?,
        tags: clean_tags(req.tags),
        is_private: req.is_private,
    };

    let entry = journal::insert_entry(&state.db, session.user.id, &new).await?;

    state.event_bus.emit_lossy(AutomationEvent::JournalCreated {
        user_id: entry.user_id,
        entry_id: entry.id,
        title: entry.title.clone(),
        timestamp: entry.created_at,
    });

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/journal/:id
pub async fn get_entry(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<JournalEntry>> {
    journal::get_entry(&state.db, session.user.id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /api/journal/:id
pub async fn update_entry(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateJournalRequest>,
) -> ApiResult<Json<JournalEntry>> {
    let update = JournalUpdate {
        title: req
            .title
            .map(|t| required_text("title", &t, TITLE_MAX))
            .transpose()?,
        content: req
            .content
            .map(|c| required_text("content", &c, CONTENT_MAX))
            .transpose()?,
        mood: req.mood.map(|m| in_range("mood", m, 1, 10)).transpose()?,
        tags: req.tags.map(clean_tags),
        is_private: req.is_private,
    };

    journal::update_entry(&state.db, session.user.id, id, &update)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /api/journal/:id
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if journal::delete_entry(&state.db, session.user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/journal", get(list_entries).post(create_entry))
        .route(
            "/api/journal/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}

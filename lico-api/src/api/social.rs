//! Social endpoints: communities, membership, posts, events and RSVPs
//!
//! Communities are visible to every signed-in user. Posting and organizing
//! events require membership in the community.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validate::{one_of, optional_text, required_text, timestamp};
use crate::db::social::{
    self, Community, CommunityEvent, CommunityPost, Membership, NewCommunityEvent, Rsvp,
};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageQuery, Pagination};
use crate::AppState;

const RSVP_STATUSES: &[&str] = &["going", "maybe", "declined"];

fn community_not_found() -> ApiError {
    ApiError::NotFound("Community not found".to_string())
}

async fn require_community(pool: &SqlitePool, id: Uuid) -> ApiResult<Community> {
    social::get_community(pool, id)
        .await?
        .ok_or_else(community_not_found)
}

async fn require_member(pool: &SqlitePool, community_id: Uuid, user_id: Uuid, action: &str) -> ApiResult<()> {
    match social::membership_role(pool, community_id, user_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::Forbidden(format!(
            "Must be a member of this community to {}",
            action
        ))),
    }
}

// ========================================
// Communities and membership
// ========================================

#[derive(Debug, Default, Deserialize)]
pub struct CommunityListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommunityListResponse {
    pub communities: Vec<Community>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// GET /api/social/communities
pub async fn list_communities(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommunityListQuery>,
) -> ApiResult<Json<CommunityListResponse>> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let communities = social::list_communities(&state.db, category).await?;
    Ok(Json(CommunityListResponse { communities }))
}

/// POST /api/social/communities
///
/// The creator becomes the owner and first member. Names are unique.
pub async fn create_community(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateCommunityRequest>,
) -> ApiResult<(StatusCode, Json<Community>)> {
    let name = required_text("name", &req.name, 100)?;
    let description = optional_text("description", req.description, 1000)?;
    let category = optional_text("category", req.category, 50)?;

    let community = social::insert_community(&state.db, session.user.id, &name, description, category)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Community name already taken".to_string()),
            other => other,
        })?;

    info!(user_id = %session.user.id, community_id = %community.id, "Community created");
    Ok((StatusCode::CREATED, Json(community)))
}

/// POST /api/social/communities/:id/membership
pub async fn join_community(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    require_community(&state.db, id).await?;

    let membership = social::join_community(&state.db, id, session.user.id)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("Already a member of this community".to_string())
            }
            other => other,
        })?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// DELETE /api/social/communities/:id/membership
///
/// The owner cannot leave their own community.
pub async fn leave_community(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    require_community(&state.db, id).await?;

    match social::membership_role(&state.db, id, session.user.id).await?.as_deref() {
        None => Err(ApiError::NotFound("Not a member of this community".to_string())),
        Some("owner") => Err(ApiError::BadRequest(
            "Community owner cannot leave".to_string(),
        )),
        Some(_) => {
            social::leave_community(&state.db, id, session.user.id).await?;
            Ok(StatusCode::NO_CONTENT)
        }
    }
}

// ========================================
// Posts
// ========================================

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<CommunityPost>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

/// GET /api/social/communities/:id/posts
pub async fn list_posts(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PostListResponse>> {
    require_community(&state.db, id).await?;

    let total = social::count_posts(&state.db, id).await?;
    let pagination = page.paginate(total);
    let posts = social::list_posts(&state.db, id, pagination.limit, pagination.offset).await?;

    Ok(Json(PostListResponse { posts, pagination }))
}

/// POST /api/social/communities/:id/posts
pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<CommunityPost>)> {
    let content = required_text("content", &req.content, 5000)?;
    require_community(&state.db, id).await?;
    require_member(&state.db, id, session.user.id, "post").await?;

    let post = social::insert_post(&state.db, id, session.user.id, &content).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

// ========================================
// Events and RSVPs
// ========================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub community_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<CommunityEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub community_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: String,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub status: String,
}

/// GET /api/social/events
///
/// Upcoming events, soonest first.
pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EventListQuery>,
) -> ApiResult<Json<EventListResponse>> {
    let events = social::list_upcoming_events(&state.db, query.community_id, Utc::now()).await?;
    Ok(Json(EventListResponse { events }))
}

/// POST /api/social/events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<CommunityEvent>)> {
    let title = required_text("title", &req.title, 200)?;
    let starts_at: DateTime<Utc> = timestamp("startsAt", &req.starts_at)?;
    let new = NewCommunityEvent {
        community_id: req.community_id,
        title,
        description: optional_text("description", req.description, 2000)?,
        starts_at,
        location: optional_text("location", req.location, 200)?,
    };

    require_community(&state.db, new.community_id).await?;
    require_member(&state.db, new.community_id, session.user.id, "organize events").await?;

    let event = social::insert_event(&state.db, session.user.id, &new).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// POST /api/social/events/:id/rsvp
pub async fn rsvp_event(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RsvpRequest>,
) -> ApiResult<Json<Rsvp>> {
    let status = one_of("status", &req.status, RSVP_STATUSES)?;
    social::get_event(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let rsvp = social::upsert_rsvp(&state.db, id, session.user.id, &status).await?;
    Ok(Json(rsvp))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/social/communities",
            get(list_communities).post(create_community),
        )
        .route(
            "/api/social/communities/:id/membership",
            post(join_community).delete(leave_community),
        )
        .route(
            "/api/social/communities/:id/posts",
            get(list_posts).post(create_post),
        )
        .route("/api/social/events", get(list_events).post(create_event))
        .route("/api/social/events/:id/rsvp", post(rsvp_event))
}

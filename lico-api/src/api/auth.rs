//! Session authentication
//!
//! Clients register or log in to receive an opaque bearer token. The
//! [`require_session`] middleware resolves `Authorization: Bearer <token>` to
//! a user and stores an [`AuthSession`] in the request extensions for
//! handlers to extract.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use lico_common::auth::{validate_credentials, verify_password};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::extract::ApiJson;
use super::validate::required_text;
use crate::db::users::{self, User};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated caller, inserted by [`require_session`]
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    /// Raw bearer token of this session
    pub token: String,
}

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Session middleware for every user-facing `/api` route
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?
        .to_string();

    let user = users::find_user_by_session(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

    request.extensions_mut().insert(AuthSession { user, token });
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    validate_credentials(&req.email, &req.password)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let name = required_text("name", &req.name, 100)?;

    let user = users::create_user(&state.db, &req.email, &name, &req.password)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Email already registered".to_string()),
            other => other,
        })?;
    let (token, expires_at) =
        users::create_session(&state.db, user.id, state.config.session_ttl_hours).await?;

    info!(user_id = %user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user,
            token,
            expires_at,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(creds) = users::find_credentials(&state.db, &req.email).await? else {
        return Err(invalid());
    };
    if !verify_password(&req.password, &creds.password_salt, &creds.password_hash) {
        warn!(user_id = %creds.user.id, "Failed login attempt");
        return Err(invalid());
    }

    let (token, expires_at) =
        users::create_session(&state.db, creds.user.id, state.config.session_ttl_hours).await?;
    Ok(Json(SessionResponse {
        user: creds.user,
        token,
        expires_at,
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    users::delete_session(&state.db, &session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
pub async fn me(Extension(session): Extension<AuthSession>) -> Json<User> {
    Json(session.user)
}

/// Register and login (no session required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

/// Logout and current-user lookup
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

//! Creative project endpoints
//!
//! Assets are text generated by the LLM from a user prompt in the context of
//! the project. A failed generation stores nothing.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiPath};
use super::validate::{optional_text, required_text};
use crate::db::creative::{self, CreativeProject, GeneratedAsset};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<CreativeProject>,
}

#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    pub assets: Vec<GeneratedAsset>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    /// story, poem, music, art, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAssetRequest {
    pub prompt: String,
    /// Defaults to "text"
    pub asset_type: Option<String>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Project not found".to_string())
}

fn asset_prompt(project: &CreativeProject, asset_type: &str, prompt: &str) -> String {
    let mut text = format!(
        "You are a creative assistant helping with a {} project titled \"{}\".",
        project.kind, project.title
    );
    if let Some(description) = &project.description {
        text.push_str(&format!(" Project description: {}.", description));
    }
    text.push_str(&format!(
        "\n\nCreate the following {}: {}\n\nRespond with the finished piece only.",
        asset_type, prompt
    ));
    text
}

/// GET /api/creative/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<ProjectListResponse>> {
    let projects = creative::list_projects(&state.db, session.user.id).await?;
    Ok(Json(ProjectListResponse { projects }))
}

/// POST /api/creative/projects
pub async fn create_project(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<CreativeProject>)> {
    let title = required_text("title", &req.title, 200)?;
    let kind = required_text("type", &req.kind, 50)?.to_lowercase();
    let description = optional_text("description", req.description, 2000)?;

    let project =
        creative::insert_project(&state.db, session.user.id, &title, &kind, description).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// DELETE /api/creative/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if creative::delete_project(&state.db, session.user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// GET /api/creative/projects/:id/assets
pub async fn list_assets(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<AssetListResponse>> {
    creative::get_project(&state.db, session.user.id, id)
        .await?
        .ok_or_else(not_found)?;

    let assets = creative::list_assets(&state.db, id).await?;
    Ok(Json(AssetListResponse { assets }))
}

/// POST /api/creative/projects/:id/assets
pub async fn generate_asset(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<GenerateAssetRequest>,
) -> ApiResult<(StatusCode, Json<GeneratedAsset>)> {
    let prompt = required_text("prompt", &req.prompt, 2000)?;
    let asset_type = optional_text("assetType", req.asset_type, 50)?
        .map(|t| t.to_lowercase())
        .unwrap_or_else(|| "text".to_string());

    let project = creative::get_project(&state.db, session.user.id, id)
        .await?
        .ok_or_else(not_found)?;

    let content = match state
        .llm
        .generate(&asset_prompt(&project, &asset_type, &prompt))
        .await
    {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            return Err(ApiError::Internal(
                "Asset generation returned no content".to_string(),
            ))
        }
        Err(e) => {
            warn!(project_id = %project.id, "Asset generation failed: {}", e);
            return Err(ApiError::Internal(format!("Asset generation failed: {}", e)));
        }
    };

    let asset = creative::insert_asset(
        &state.db,
        project.id,
        session.user.id,
        &asset_type,
        &prompt,
        &content,
    )
    .await?;

    info!(project_id = %project.id, asset_id = %asset.id, "Asset generated");
    Ok((StatusCode::CREATED, Json(asset)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/creative/projects",
            get(list_projects).post(create_project),
        )
        .route("/api/creative/projects/:id", delete(delete_project))
        .route(
            "/api/creative/projects/:id/assets",
            get(list_assets).post(generate_asset),
        )
}

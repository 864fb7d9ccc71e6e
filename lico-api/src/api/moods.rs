//! Mood tracking endpoints

use axum::{extract::State, http::StatusCode, routing::get, Extension, Json, Router};
use lico_common::events::{AutomationEvent, MOOD_ALERT_THRESHOLD};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiQuery};
use super::validate::{clean_tags, in_range, optional_text};
use crate::db::moods::{self, MoodEntry};
use crate::error::ApiResult;
use crate::llm::TextGenerator;
use crate::pagination::{PageQuery, Pagination};
use crate::AppState;

/// Longest stored AI insight, in characters
pub const MOOD_INSIGHT_MAX_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CreateMoodRequest {
    pub mood: i64,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MoodListResponse {
    pub moods: Vec<MoodEntry>,
    pub pagination: Pagination,
}

fn insight_prompt(mood: i64, notes: &str, tags: &[String]) -> String {
    let tags = if tags.is_empty() {
        "none".to_string()
    } else {
        tags.join(", ")
    };
    format!(
        "Analyze this mood entry and provide a brief, supportive insight (max {} characters): \"{}\". \
         Mood score: {}/10. Tags: {}. Focus on patterns, encouragement, or gentle suggestions.",
        MOOD_INSIGHT_MAX_CHARS, notes, mood, tags
    )
}

/// Supportive one-liner for a noted mood entry; None when generation fails
async fn mood_insight(llm: &dyn TextGenerator, entry: &MoodEntry, notes: &str) -> Option<String> {
    match llm.generate(&insight_prompt(entry.mood, notes, &entry.tags)).await {
        Ok(text) => {
            let text: String = text.trim().chars().take(MOOD_INSIGHT_MAX_CHARS).collect();
            (!text.is_empty()).then_some(text)
        }
        Err(e) => {
            warn!(entry_id = %entry.id, "Mood insight generation failed: {}", e);
            None
        }
    }
}

/// GET /api/mood
pub async fn list_moods(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<MoodListResponse>> {
    let total = moods::count_moods(&state.db, session.user.id).await?;
    let pagination = page.paginate(total);
    let moods =
        moods::list_moods(&state.db, session.user.id, pagination.limit, pagination.offset).await?;

    Ok(Json(MoodListResponse { moods, pagination }))
}

/// POST /api/mood
///
/// Emits `mood.created`, plus `mood.below_threshold` for low scores.
pub async fn create_mood(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateMoodRequest>,
) -> ApiResult<(StatusCode, Json<MoodEntry>)> {
    let mood = in_range("mood", req.mood, 1, 10)?;
    let notes = optional_text("notes", req.notes, 2000)?;

    let mut entry =
        moods::insert_mood(&state.db, session.user.id, mood, notes, clean_tags(req.tags)).await?;

    if let Some(notes) = entry.notes.clone() {
        if let Some(insight) = mood_insight(state.llm.as_ref(), &entry, &notes).await {
            moods::set_ai_insight(&state.db, entry.id, &insight).await?;
            entry.ai_insight = Some(insight);
        }
    }

    state.event_bus.emit_lossy(AutomationEvent::MoodCreated {
        user_id: entry.user_id,
        entry_id: entry.id,
        mood_score: entry.mood,
        notes: entry.notes.clone(),
        tags: entry.tags.clone(),
        timestamp: entry.created_at,
    });
    if entry.mood <= MOOD_ALERT_THRESHOLD {
        state.event_bus.emit_lossy(AutomationEvent::MoodBelowThreshold {
            user_id: entry.user_id,
            entry_id: entry.id,
            mood_score: entry.mood,
            timestamp: entry.created_at,
        });
    }

    Ok((StatusCode::CREATED, Json(entry)))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/mood", get(list_moods).post(create_mood))
}

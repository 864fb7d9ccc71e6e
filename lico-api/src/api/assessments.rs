//! Mental health self-assessment endpoints

use axum::{extract::State, http::StatusCode, routing::get, Extension, Json, Router};
use lico_common::events::AutomationEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiQuery};
use super::validate::{optional_text, required_text};
use crate::db::assessments::{self, Assessment};
use crate::error::{ApiError, ApiResult};
use crate::llm::TextGenerator;
use crate::pagination::{PageQuery, Pagination};
use crate::AppState;

/// Longest stored summary, in characters
pub const ASSESSMENT_SUMMARY_MAX_CHARS: usize = 500;

/// Summary stored when the LLM is unavailable
pub const ASSESSMENT_SUMMARY_FALLBACK: &str =
    "Thank you for checking in with yourself. This result is one data point, not a diagnosis. \
     If these feelings persist or get heavier, consider talking with someone you trust or a professional.";

#[derive(Debug, Deserialize)]
pub struct CreateAssessmentRequest {
    #[serde(rename = "type")]
    pub assessment_type: String,
    #[serde(default)]
    pub scores: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssessmentListQuery {
    #[serde(rename = "type")]
    pub assessment_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentListResponse {
    pub assessments: Vec<Assessment>,
    pub pagination: Pagination,
}

fn summary_prompt(assessment_type: &str, scores: &Value) -> String {
    format!(
        "Analyze this {} assessment result and provide a supportive, professional summary (max {} characters). \
         Focus on patterns, severity level, and gentle suggestions. Be encouraging and emphasize that this is \
         just one data point. Results: {}",
        assessment_type, ASSESSMENT_SUMMARY_MAX_CHARS, scores
    )
}

/// Supportive summary of an assessment; the fixed fallback when generation fails
async fn assessment_summary(llm: &dyn TextGenerator, assessment: &Assessment) -> String {
    match llm
        .generate(&summary_prompt(&assessment.assessment_type, &assessment.scores))
        .await
    {
        Ok(text) => {
            let text: String = text.trim().chars().take(ASSESSMENT_SUMMARY_MAX_CHARS).collect();
            if text.is_empty() {
                ASSESSMENT_SUMMARY_FALLBACK.to_string()
            } else {
                text
            }
        }
        Err(e) => {
            warn!(assessment_id = %assessment.id, "Assessment summary generation failed: {}", e);
            ASSESSMENT_SUMMARY_FALLBACK.to_string()
        }
    }
}

/// GET /api/mental-health/assessment
pub async fn list_assessments(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiQuery(query): ApiQuery<AssessmentListQuery>,
) -> ApiResult<Json<AssessmentListResponse>> {
    let assessment_type = optional_text("type", query.assessment_type, 50)?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let total =
        assessments::count_assessments(&state.db, session.user.id, assessment_type.as_deref())
            .await?;
    let pagination = page.paginate(total);
    let assessments = assessments::list_assessments(
        &state.db,
        session.user.id,
        assessment_type.as_deref(),
        pagination.limit,
        pagination.offset,
    )
    .await?;

    Ok(Json(AssessmentListResponse {
        assessments,
        pagination,
    }))
}

/// POST /api/mental-health/assessment
///
/// Stores the scores, attaches an LLM summary and emits `assessment.completed`.
pub async fn create_assessment(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateAssessmentRequest>,
) -> ApiResult<(StatusCode, Json<Assessment>)> {
    let assessment_type = required_text("type", &req.assessment_type, 50)?;
    if req.scores.is_null() {
        return Err(ApiError::BadRequest("scores is required".to_string()));
    }

    let mut assessment =
        assessments::insert_assessment(&state.db, session.user.id, &assessment_type, req.scores)
            .await?;

    let summary = assessment_summary(state.llm.as_ref(), &assessment).await;
    assessments::set_summary(&state.db, assessment.id, &summary).await?;
    assessment.summary = Some(summary);

    state.event_bus.emit_lossy(AutomationEvent::AssessmentCompleted {
        user_id: assessment.user_id,
        assessment_id: assessment.id,
        assessment_type: assessment.assessment_type.clone(),
        timestamp: assessment.created_at,
    });

    Ok((StatusCode::CREATED, Json(assessment)))
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/mental-health/assessment",
        get(list_assessments).post(create_assessment),
    )
}

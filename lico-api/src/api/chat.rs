//! Companion chat endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::extract::ApiJson;
use super::validate::{optional_text, required_text};
use crate::error::{ApiError, ApiResult};
use crate::llm::ChatMessage;
use crate::AppState;

const SYSTEM_PROMPT: &str = "You are Hope, a warm and practical life companion. You help with \
wellbeing, habits, personal finance, relationships and creative work. Be concise, \
encouraging and concrete. You are not a medical professional; suggest professional help \
when someone describes a crisis.";

/// Reply used when the LLM cannot be reached
pub const CHAT_FALLBACK: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";

/// Oldest history turns beyond this are dropped
const MAX_HISTORY: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    /// True when `response` is the canned fallback
    pub fallback: bool,
}

/// System prompt, optional context, recent history, then the new prompt
fn build_messages(prompt: String, history: Vec<ChatMessage>, context: Option<String>) -> ApiResult<Vec<ChatMessage>> {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
    if let Some(context) = context {
        messages.push(ChatMessage::system(format!("Context: {}", context)));
    }

    let skip = history.len().saturating_sub(MAX_HISTORY);
    for turn in history.into_iter().skip(skip) {
        if turn.role != "user" && turn.role != "assistant" {
            return Err(ApiError::BadRequest(format!(
                "history role must be user or assistant, got {}",
                turn.role
            )));
        }
        messages.push(turn);
    }

    messages.push(ChatMessage::user(prompt));
    Ok(messages)
}

/// POST /api/ai/chat
pub async fn chat(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let prompt = required_text("prompt", &req.prompt, 4000)?;
    let context = optional_text("context", req.context, 2000)?;
    let messages = build_messages(prompt, req.history, context)?;

    let (response, fallback) = match state.llm.chat(&messages).await {
        Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), false),
        Ok(_) => (CHAT_FALLBACK.to_string(), true),
        Err(e) => {
            warn!("Chat generation failed: {}", e);
            (CHAT_FALLBACK.to_string(), true)
        }
    };

    Ok(Json(ChatResponse {
        response,
        model: state.llm.model().to_string(),
        fallback,
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/ai/chat", post(chat))
}

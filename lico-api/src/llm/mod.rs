//! Text generation against an Ollama-compatible endpoint
//!
//! Handlers and services depend on the [`TextGenerator`] trait so tests can
//! substitute a scripted generator. Every caller degrades to a fixed
//! fallback string when generation fails; there is no retry.

pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ollama::OllamaClient;

/// LLM client errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// Connection, timeout or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One turn of a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Source of generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Multi-turn chat completion; returns the assistant message content
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Single prompt completion
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Reachability probe
    async fn ping(&self) -> Result<(), LlmError>;

    /// Model name reported to clients
    fn model(&self) -> &str;
}

/// Extract the first `{` .. last `}` span of an LLM reply
///
/// Models often wrap JSON in prose or code fences; this returns the widest
/// brace-delimited slice without validating it.
///
/// # Examples
///
/// ```
/// use lico_api::llm::extract_json_object;
///
/// let reply = "Sure! ```json\n{\"a\": {\"b\": 1}}\n``` Hope that helps.";
/// assert_eq!(extract_json_object(reply), Some("{\"a\": {\"b\": 1}}"));
/// assert_eq!(extract_json_object("no json here"), None);
/// ```
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_bare() {
        assert_eq!(extract_json_object("{}"), Some("{}"));
    }

    #[test]
    fn test_extract_json_object_reversed_braces() {
        assert_eq!(extract_json_object("} then {"), None);
    }

    #[test]
    fn test_extract_json_object_only_open_brace() {
        assert_eq!(extract_json_object("{ unterminated"), None);
    }

    #[test]
    fn test_chat_message_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
    }
}

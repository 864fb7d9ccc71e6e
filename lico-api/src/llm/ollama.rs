//! Ollama HTTP client
//!
//! Endpoints used:
//! - `POST /api/chat` (non-streaming), reply in `message.content`
//! - `POST /api/generate` (non-streaming), reply in `response`
//! - `GET /api/tags` as a reachability probe

use super::{ChatMessage, LlmError, TextGenerator};
use async_trait::async_trait;
use lico_common::config::OllamaConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Sampling options forwarded with every request
#[derive(Debug, Clone, Serialize)]
struct GenerationOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: &'a GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama API client
pub struct OllamaClient {
    http_client: Client,
    base_url: String,
    model: String,
    options: GenerationOptions,
}

impl OllamaClient {
    /// Create a client from the `[ollama]` configuration section
    pub fn new(config: &OllamaConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            options: GenerationOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                num_predict: config.max_tokens,
            },
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = self.url(path);
        tracing::debug!(url = %url, model = %self.model, "Calling LLM endpoint");

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(status.as_u16(), error_text));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: &self.options,
        };
        let reply: ChatResponse = self.post_json("/api/chat", &request).await?;
        Ok(reply.message.content)
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: &self.options,
        };
        let reply: GenerateResponse = self.post_json("/api/generate", &request).await?;
        Ok(reply.response)
    }

    async fn ping(&self) -> Result<(), LlmError> {
        let response = self
            .http_client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LlmError::Api(status.as_u16(), "reachability probe failed".to_string()))
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = OllamaConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..OllamaConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.url("/api/chat"), "http://localhost:11434/api/chat");
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_chat_request_shape() {
        let options = GenerationOptions {
            temperature: 0.5,
            top_p: 0.9,
            num_predict: 100,
        };
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "llama3",
            messages: &messages,
            stream: false,
            options: &options,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["options"]["num_predict"], 100);
    }
}

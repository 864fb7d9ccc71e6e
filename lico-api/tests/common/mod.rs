//! Shared helpers for lico-api integration tests
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use lico_api::llm::{ChatMessage, LlmError, TextGenerator};
use lico_api::{build_router, AppState, ServiceConfig};
use lico_common::db::init_database;
use lico_common::events::{AutomationEvent, EventBus};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tower::util::ServiceExt; // for `oneshot`

pub const CRON_SECRET: &str = "test-cron-secret";

/// Text generator answering every call with the same reply, or failing
pub struct ScriptedGenerator {
    reply: Option<String>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }

    fn answer(&self) -> Result<String, LlmError> {
        self.reply
            .clone()
            .ok_or_else(|| LlmError::Network("connection refused".to_string()))
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn chat(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.answer()
    }

    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.answer()
    }

    async fn ping(&self) -> Result<(), LlmError> {
        self.answer().map(|_| ())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Router plus the state behind it; keep `_dir` alive for the whole test
pub struct TestApp {
    pub _dir: TempDir,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn new(llm: ScriptedGenerator) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_database(&dir.path().join("lico.db")).await.unwrap();
        let config = ServiceConfig {
            cron_secret: Some(CRON_SECRET.to_string()),
            ..ServiceConfig::default()
        };
        let state = AppState::new(pool, EventBus::new(64), Arc::new(llm), config);
        let router = build_router(state.clone());
        Self {
            _dir: dir,
            state,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send and decode the JSON body (Null for an empty body)
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (u16, Value) {
        let response = self.send(request(method, uri, token, body)).await;
        let status = response.status().as_u16();
        (status, extract_json(response.into_body()).await)
    }

    /// Register a user and return the session token
    pub async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": "password123",
                    "name": "Test User",
                })),
            )
            .await;
        assert_eq!(status, 201, "register failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

/// Event types received so far, in emission order
pub fn drain_event_types(rx: &mut broadcast::Receiver<AutomationEvent>) -> Vec<&'static str> {
    let mut types = Vec::new();
    while let Ok(event) = rx.try_recv() {
        types.push(event.event_type());
    }
    types
}

//! OllamaClient against a local stand-in server

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lico_api::llm::{ChatMessage, LlmError, OllamaClient, TextGenerator};
use lico_common::config::OllamaConfig;
use serde_json::{json, Value};

/// Serve `router` on an ephemeral port and return its base URL
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: String) -> OllamaClient {
    OllamaClient::new(&OllamaConfig {
        base_url,
        model: "test-model".to_string(),
        timeout_secs: 5,
        ..OllamaConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_chat_and_generate_round_trip() {
    let router = Router::new()
        .route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                // Echo the last message so the test can check what was sent
                let last = body["messages"].as_array().unwrap().last().unwrap().clone();
                assert_eq!(body["model"], "test-model");
                assert_eq!(body["stream"], false);
                Json(json!({
                    "model": "test-model",
                    "message": { "role": "assistant", "content": format!("echo: {}", last["content"].as_str().unwrap()) },
                    "done": true,
                }))
            }),
        )
        .route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "response": format!("gen: {}", body["prompt"].as_str().unwrap()), "done": true }))
            }),
        )
        .route("/api/tags", get(|| async { Json(json!({ "models": [] })) }));
    let llm = client(serve(router).await);

    let reply = llm
        .chat(&[ChatMessage::system("be kind"), ChatMessage::user("hello")])
        .await
        .unwrap();
    assert_eq!(reply, "echo: hello");

    assert_eq!(llm.generate("a poem").await.unwrap(), "gen: a poem");
    assert!(llm.ping().await.is_ok());
    assert_eq!(llm.model(), "test-model");
}

#[tokio::test]
async fn test_error_statuses_and_bad_bodies() {
    let router = Router::new()
        .route(
            "/api/chat",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
        )
        .route("/api/generate", post(|| async { Json(json!({ "unexpected": true })) }));
    let llm = client(serve(router).await);

    match llm.chat(&[ChatMessage::user("hi")]).await {
        Err(LlmError::Api(status, text)) => {
            assert_eq!(status, 500);
            assert_eq!(text, "model not loaded");
        }
        other => panic!("expected API error, got {:?}", other),
    }

    assert!(matches!(llm.generate("x").await, Err(LlmError::Parse(_))));
    // No /api/tags route
    assert!(matches!(llm.ping().await, Err(LlmError::Api(404, _))));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let llm = client(format!("http://{}", addr));
    assert!(matches!(llm.generate("x").await, Err(LlmError::Network(_))));
}

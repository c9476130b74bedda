// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Router tests for the chat page, static assets, /chat and /health

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use jarvis_rag_node::{
    api::{create_app, AppState, ErrorResponse, HealthResponse},
    inference::{GenerationParams, ResponseGenerator, TextGenerator, OFFLINE_MESSAGE},
    orchestrator::{ChatResponse, RequestOrchestrator},
    rag::KnowledgeRetriever,
    version,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct EchoModel;

#[async_trait]
impl TextGenerator for EchoModel {
    async fn complete(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        let query = prompt
            .rsplit("User: ")
            .next()
            .and_then(|tail| tail.split('\n').next())
            .unwrap_or_default();
        Ok(format!(" You said: {} ", query))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Static directory with a page, a stylesheet and a script
fn static_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        "<!DOCTYPE html><html><body>J.A.R.V.I.S.</body></html>",
    )
    .unwrap();
    std::fs::write(dir.path().join("style.css"), "body { color: cyan; }").unwrap();
    std::fs::write(dir.path().join("script.js"), "console.log('online');").unwrap();
    dir
}

fn app(generator: ResponseGenerator, dir: &TempDir) -> Router {
    let orchestrator = RequestOrchestrator::new(KnowledgeRetriever::disabled(), generator);
    create_app(Arc::new(AppState::new(orchestrator, dir.path())))
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_chat_returns_model_reply() {
    let dir = static_dir();
    let app = app(ResponseGenerator::new(Some(Arc::new(EchoModel))), &dir);

    let response = app
        .oneshot(chat_request(r#"{"query": "Status report"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reply: ChatResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(reply.response, "You said: Status report");
}

#[tokio::test]
async fn test_chat_offline_model() {
    let dir = static_dir();
    let app = app(ResponseGenerator::offline(), &dir);

    let response = app
        .oneshot(chat_request(r#"{"query": "Hello"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "response": OFFLINE_MESSAGE }));
}

#[tokio::test]
async fn test_chat_accepts_empty_query() {
    let dir = static_dir();
    let app = app(ResponseGenerator::offline(), &dir);

    let response = app.oneshot(chat_request(r#"{"query": ""}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let dir = static_dir();

    for body in [r#"{"question": "hi"}"#, r#"{"query": 42}"#, "not json"] {
        let response = app(ResponseGenerator::offline(), &dir)
            .oneshot(chat_request(body))
            .await
            .unwrap();
        assert!(
            response.status().is_client_error(),
            "body {:?} gave {}",
            body,
            response.status()
        );
    }
}

#[tokio::test]
async fn test_chat_requires_post() {
    let dir = static_dir();
    let response = app(ResponseGenerator::offline(), &dir)
        .oneshot(Request::builder().uri("/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_index_serves_chat_page() {
    let dir = static_dir();
    let response = app(ResponseGenerator::offline(), &dir)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    assert!(body_string(response).await.contains("J.A.R.V.I.S."));
}

#[tokio::test]
async fn test_index_missing_page_is_server_error() {
    let dir = TempDir::new().unwrap();
    let response = app(ResponseGenerator::offline(), &dir)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.error_type, "internal_error");
    assert!(body.message.contains("index.html"));
}

#[tokio::test]
async fn test_static_assets_served() {
    let dir = static_dir();

    let response = app(ResponseGenerator::offline(), &dir)
        .oneshot(
            Request::builder()
                .uri("/static/style.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "body { color: cyan; }");

    let response = app(ResponseGenerator::offline(), &dir)
        .oneshot(
            Request::builder()
                .uri("/static/missing.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_degraded_subsystems() {
    let dir = static_dir();
    let response = app(ResponseGenerator::new(Some(Arc::new(EchoModel))), &dir)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(health.status, "degraded");
    assert!(health.model_loaded);
    assert!(!health.knowledge_base);
    assert!(!health.embeddings);
    assert_eq!(health.version, version::VERSION);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let dir = static_dir();
    let response = app(ResponseGenerator::offline(), &dir)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/chat")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use super::errors::ApiError;
use super::server::AppState;
use crate::orchestrator::{ChatRequest, ChatResponse};
use crate::version;

pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    /// `"ok"` when every subsystem loaded, `"degraded"` otherwise
    pub status: String,
    pub model_loaded: bool,
    pub knowledge_base: bool,
    pub embeddings: bool,
    pub version: String,
}

/// `GET /`: the chat page
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let path = state.static_dir.join(INDEX_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Ok(Html(body)),
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            Err(ApiError::InternalError(format!("{} unavailable", INDEX_FILE)))
        }
    }
}

/// `POST /chat`
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    Json(state.orchestrator.handle_chat(&request.query).await)
}

/// `GET /health`
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model_loaded = state.orchestrator.generator().is_available();
    let retriever = state.orchestrator.retriever();
    let knowledge_base = retriever.has_index();
    let embeddings = retriever.encoder().is_available();

    let status = if model_loaded && knowledge_base && embeddings {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        model_loaded,
        knowledge_base,
        embeddings,
        version: version::VERSION.to_string(),
    })
}

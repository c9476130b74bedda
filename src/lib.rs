// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;
pub mod inference;
pub mod orchestrator;
pub mod rag;
pub mod utils;
pub mod version;

pub use api::{create_app, AppState};
pub use config::{EmbeddingConfig, EngineConfig, KnowledgeBaseConfig, NodeConfig};
pub use embeddings::SentenceEncoder;
pub use inference::{LlmEngine, ResponseGenerator, TextGenerator};
pub use orchestrator::{ChatRequest, ChatResponse, RequestOrchestrator};
pub use rag::{KnowledgeRetriever, PineconeIndex, VectorIndex};

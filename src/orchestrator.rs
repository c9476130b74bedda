// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat request orchestration: retrieval, then generation

use serde::{Deserialize, Serialize};
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use crate::inference::ResponseGenerator;
use crate::rag::KnowledgeRetriever;
use crate::utils::preview;

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub query: String,
}

/// Reply to `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
}

/// Runs a chat query through retrieval and generation
///
/// Both collaborators resolve their own failures to text, so this never
/// fails. Retrieval always finishes before generation starts.
#[derive(Debug, Clone)]
pub struct RequestOrchestrator {
    retriever: KnowledgeRetriever,
    generator: ResponseGenerator,
}

impl RequestOrchestrator {
    pub fn new(retriever: KnowledgeRetriever, generator: ResponseGenerator) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub fn retriever(&self) -> &KnowledgeRetriever {
        &self.retriever
    }

    pub fn generator(&self) -> &ResponseGenerator {
        &self.generator
    }

    pub async fn handle_chat(&self, query: &str) -> ChatResponse {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("chat", %request_id);

        async {
            info!(query_chars = query.chars().count(), "Chat request received");

            let context = self.retriever.retrieve(query).await;
            if !context.is_empty() {
                debug!("Context found: {}...", preview(&context, 100));
            }

            let response = self.generator.generate(query, &context).await;
            ChatResponse { response }
        }
        .instrument(span)
        .await
    }
}

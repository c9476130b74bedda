// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) module
// Pinecone-backed knowledge base that grounds chat replies

pub mod errors;
pub mod index;
pub mod pinecone;
pub mod retriever;

pub use errors::{IndexError, RetrievalError};
pub use index::{IndexMatch, VectorIndex};
pub use pinecone::PineconeIndex;
pub use retriever::{assemble_context, KnowledgeRetriever, DEFAULT_TOP_K, RELEVANCE_THRESHOLD};

use crate::config::KnowledgeBaseConfig;
use std::sync::Arc;
use tracing::{error, warn};

/// Opens the knowledge base connection, or `None` when it is unusable
///
/// A missing API key and a failed connection are both logged, never
/// returned as errors.
pub async fn connect_knowledge_base(config: &KnowledgeBaseConfig) -> Option<Arc<dyn VectorIndex>> {
    if config.api_key().is_none() {
        warn!("Pinecone API Key not found. Vector DB features will be disabled.");
        return None;
    }

    match PineconeIndex::connect(config).await {
        Ok(index) => Some(Arc::new(index)),
        Err(e) => {
            error!("Error connecting to Pinecone: {}", e);
            None
        }
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Knowledge retrieval: query embedding, index search, relevance filtering
//! and context assembly.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

use super::errors::{IndexError, RetrievalError};
use super::index::{IndexMatch, VectorIndex};
use crate::embeddings::SentenceEncoder;
use crate::utils::panic_message;

/// Matches must score strictly above this to reach the prompt
pub const RELEVANCE_THRESHOLD: f32 = 0.7;

/// Neighbours requested from the index per query
pub const DEFAULT_TOP_K: usize = 3;

/// Finds stored snippets related to a query
///
/// Never fails: a missing index or encoder, and any error or panic while
/// embedding or searching, all produce an empty context.
#[derive(Clone)]
pub struct KnowledgeRetriever {
    index: Option<Arc<dyn VectorIndex>>,
    encoder: SentenceEncoder,
}

impl KnowledgeRetriever {
    pub fn new(index: Option<Arc<dyn VectorIndex>>, encoder: SentenceEncoder) -> Self {
        Self { index, encoder }
    }

    /// Retriever with no knowledge base behind it
    pub fn disabled() -> Self {
        Self::new(None, SentenceEncoder::unavailable())
    }

    /// True when both the index and the encoder are present
    pub fn is_available(&self) -> bool {
        self.index.is_some() && self.encoder.is_available()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn encoder(&self) -> &SentenceEncoder {
        &self.encoder
    }

    /// Context block for `query` using [`DEFAULT_TOP_K`]
    pub async fn retrieve(&self, query: &str) -> String {
        self.retrieve_top_k(query, DEFAULT_TOP_K).await
    }

    /// Context block for `query` built from the best `top_k` matches that
    /// clear [`RELEVANCE_THRESHOLD`]
    pub async fn retrieve_top_k(&self, query: &str, top_k: usize) -> String {
        let index = match &self.index {
            Some(index) if self.encoder.is_available() => index,
            _ => return String::new(),
        };

        let attempt = AssertUnwindSafe(self.search(index.as_ref(), query, top_k))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(RetrievalError::Panicked(panic_message(panic.as_ref()))));

        match attempt {
            Ok(context) => context,
            Err(e) => {
                error!("Error querying {}: {}", index.name(), e);
                String::new()
            }
        }
    }

    async fn search(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        top_k: usize,
    ) -> Result<String, RetrievalError> {
        let embedding = self.encoder.embed(query).await?;
        if let Some(expected) = self.encoder.dimension() {
            if embedding.len() != expected {
                return Err(IndexError::InvalidVector(format!(
                    "expected {} dimensions, got {}",
                    expected,
                    embedding.len()
                ))
                .into());
            }
        }

        let matches = index.query(&embedding, top_k).await?;
        debug!(
            index = index.name(),
            returned = matches.len(),
            "Knowledge base search complete"
        );
        Ok(assemble_context(&matches, RELEVANCE_THRESHOLD))
    }
}

impl std::fmt::Debug for KnowledgeRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeRetriever")
            .field("index", &self.index.as_ref().map(|i| i.name()))
            .field("encoder", &self.encoder)
            .finish()
    }
}

/// Joins the text of every match scoring above `threshold`, in the order
/// given, one per line. Matches without text keep an empty line.
pub fn assemble_context(matches: &[IndexMatch], threshold: f32) -> String {
    matches
        .iter()
        .filter(|m| m.score > threshold)
        .map(IndexMatch::text)
        .collect::<Vec<_>>()
        .join("\n")
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding provider trait and the degradable encoder handle

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns text into a fixed-length vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

/// Sentence encoder shared by the retriever
///
/// Holds `None` when the embedding model failed to initialize; in that
/// state `embed` returns an empty vector instead of an error.
#[derive(Clone, Default)]
pub struct SentenceEncoder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl SentenceEncoder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Encoder with no model behind it
    pub fn unavailable() -> Self {
        Self { provider: None }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match &self.provider {
            Some(provider) => provider.embed(text).await,
            None => Ok(Vec::new()),
        }
    }

    pub fn dimension(&self) -> Option<usize> {
        self.provider.as_ref().map(|p| p.dimension())
    }
}

impl std::fmt::Debug for SentenceEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEncoder")
            .field("model", &self.provider.as_ref().map(|p| p.model_name()))
            .finish()
    }
}

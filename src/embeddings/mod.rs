// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence embeddings for knowledge-base retrieval
//!
//! `init_encoder` runs once at startup. Any failure (missing files, no
//! network for the first download, broken ONNX export) is logged and yields
//! an unavailable encoder; retrieval then degrades to an empty context.

pub mod cache;
pub mod errors;
pub mod onnx_model;
pub mod provider;

pub use cache::{get_or_download_model, ModelFiles};
pub use errors::EmbeddingError;
pub use onnx_model::{OnnxEmbeddingModel, MINILM_DIMENSION};
pub use provider::{EmbeddingProvider, SentenceEncoder};

use crate::config::EmbeddingConfig;
use std::sync::Arc;
use tracing::{error, info};

/// Loads the embedding model described by `config`
pub async fn init_encoder(config: &EmbeddingConfig) -> SentenceEncoder {
    let config = config.clone();
    let loaded = tokio::task::spawn_blocking(move || -> Result<OnnxEmbeddingModel, EmbeddingError> {
        let files = get_or_download_model(&config)?;
        let name = config
            .repo_id
            .rsplit('/')
            .next()
            .unwrap_or(config.repo_id.as_str())
            .to_string();
        OnnxEmbeddingModel::load(name, &files.model, &files.tokenizer)
    })
    .await;

    match loaded {
        Ok(Ok(model)) => {
            info!(
                "Embedding model ready: {} ({}D)",
                model.model_name(),
                model.dimension()
            );
            SentenceEncoder::new(Arc::new(model))
        }
        Ok(Err(e)) => {
            error!("Error loading embedding model: {}", e);
            SentenceEncoder::unavailable()
        }
        Err(e) => {
            error!("Embedding model loader task failed: {}", e);
            SentenceEncoder::unavailable()
        }
    }
}

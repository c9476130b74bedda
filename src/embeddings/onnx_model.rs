// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs the all-MiniLM-L6-v2 sentence transformer through ONNX Runtime and
//! reproduces the sentence-transformers `encode` pipeline:
//! - BERT tokenization, truncated to 256 tokens
//! - Mean pooling over token embeddings, weighted by the attention mask
//! - L2 normalization
//! - 384-dimensional output vectors

use anyhow::Result;
use async_trait::async_trait;
use ndarray::{Array2, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

use super::errors::EmbeddingError;
use super::provider::EmbeddingProvider;

/// Output size of all-MiniLM-L6-v2
pub const MINILM_DIMENSION: usize = 384;

/// Longest input, in tokens, the model was trained on
pub const MINILM_MAX_TOKENS: usize = 256;

fn runtime<E: Display>(err: E) -> EmbeddingError {
    EmbeddingError::Runtime(err.to_string())
}

/// ONNX-based sentence embedding model
///
/// Cheap to clone; the session is shared behind an `Arc<Mutex<_>>` because
/// `Session::run` needs exclusive access.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer and checks the output dimension with a
    /// probe inference.
    ///
    /// Blocking: ONNX session creation can take seconds.
    ///
    /// # Errors
    /// - either file is missing or unreadable
    /// - ONNX Runtime cannot build a session
    /// - the model does not produce 384-dimensional vectors
    pub fn load<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self, EmbeddingError> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            return Err(EmbeddingError::FileNotFound(model_path.display().to_string()));
        }
        if !tokenizer_path.exists() {
            return Err(EmbeddingError::FileNotFound(
                tokenizer_path.display().to_string(),
            ));
        }

        let session = Self::build_session(model_path)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MINILM_MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: MINILM_DIMENSION,
        };

        let probe = model.embed_blocking("validation test")?;
        if probe.len() != MINILM_DIMENSION {
            return Err(EmbeddingError::DimensionMismatch {
                expected: MINILM_DIMENSION,
                actual: probe.len(),
            });
        }

        info!(model = %model.model_name, dimension = model.dimension, "Embedding model loaded");
        Ok(model)
    }

    // CUDA first, CPU when the CUDA provider is not usable.
    fn build_session(model_path: &Path) -> Result<Session, EmbeddingError> {
        let cuda = Session::builder()
            .map_err(runtime)?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .map_err(runtime)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(runtime)?
            .with_intra_threads(4)
            .map_err(runtime)?
            .commit_from_file(model_path);

        match cuda {
            Ok(session) => {
                debug!("CUDA execution provider initialized");
                Ok(session)
            }
            Err(e) => {
                warn!("CUDA execution provider unavailable ({}), using CPU", e);
                Session::builder()
                    .map_err(runtime)?
                    .with_execution_providers([CPUExecutionProvider::default().build()])
                    .map_err(runtime)?
                    .with_optimization_level(GraphOptimizationLevel::Level3)
                    .map_err(runtime)?
                    .with_intra_threads(4)
                    .map_err(runtime)?
                    .commit_from_file(model_path)
                    .map_err(|e| {
                        EmbeddingError::Runtime(format!(
                            "Failed to load ONNX model from {}: {}",
                            model_path.display(),
                            e
                        ))
                    })
            }
        }
    }

    /// Embeds one text on the calling thread
    pub fn embed_blocking(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = vec![0i64; input_ids.len()];
        let seq_len = input_ids.len();

        let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids).map_err(runtime)?;
        let attention_mask_array =
            Array2::from_shape_vec((1, seq_len), attention_mask.clone()).map_err(runtime)?;
        let token_type_ids_array =
            Array2::from_shape_vec((1, seq_len), token_type_ids).map_err(runtime)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::Runtime("ONNX session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids_array)?,
            "attention_mask" => Value::from_array(attention_mask_array)?,
            "token_type_ids" => Value::from_array(token_type_ids_array)?
        ])?;

        // [batch, seq_len, hidden_dim]; index 0 since output names differ between exports
        let output = outputs[0].try_extract_array::<f32>().map_err(runtime)?;
        let shape = output.shape().to_vec();
        if shape.len() != 3 {
            return Err(EmbeddingError::Runtime(format!(
                "unexpected output shape {:?} (expected [batch, seq_len, hidden])",
                shape
            )));
        }
        let token_embeddings = output.index_axis(Axis(0), 0);
        let hidden_dim = shape[2];

        let mut pooled = vec![0.0f32; hidden_dim];
        let mut mask_sum = 0.0f32;
        for (i, &mask) in attention_mask.iter().enumerate().take(shape[1]) {
            let weight = mask as f32;
            mask_sum += weight;
            for (j, value) in pooled.iter_mut().enumerate() {
                *value += token_embeddings[[i, j]] * weight;
            }
        }
        for value in &mut pooled {
            *value /= mask_sum.max(1e-9);
        }

        Ok(l2_normalize(pooled))
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.clone();
        let text = text.to_string();
        let embedding = tokio::task::spawn_blocking(move || model.embed_blocking(&text)).await??;
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Scales a vector to unit length; zero vectors are returned unchanged
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

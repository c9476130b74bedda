// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for embedding model setup and inference

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Required model file is missing and could not be fetched
    #[error("Model file not found: {0}")]
    FileNotFound(String),

    /// Fetching model files from HuggingFace Hub failed
    #[error("Failed to download {file} from {repo}: {message}")]
    Download {
        repo: String,
        file: String,
        message: String,
    },

    /// Tokenizer could not be loaded or failed on input
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// ONNX Runtime session creation or inference failed
    #[error("ONNX Runtime error: {0}")]
    Runtime(String),

    /// Model produced vectors of an unexpected size
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ort::Error> for EmbeddingError {
    fn from(err: ort::Error) -> Self {
        EmbeddingError::Runtime(err.to_string())
    }
}

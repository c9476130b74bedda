// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for knowledge-base access
//!
//! None of these reach the chat caller: the retriever logs them and
//! answers with an empty context.

use thiserror::Error;

/// Errors from the vector index service
#[derive(Error, Debug)]
pub enum IndexError {
    /// No API key configured
    #[error("No API key configured for {provider}")]
    NoApiKey { provider: String },

    /// API key rejected by the service
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Index name unknown to the control plane
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Service asked us to slow down
    #[error("Rate limited by vector index service")]
    RateLimited,

    /// Request did not complete in time
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Non-success status from the service
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Could not reach the service at all
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Query vector is unusable (empty, or the wrong size)
    #[error("Invalid query vector: {0}")]
    InvalidVector(String),
}

/// Any failure on the retrieval path
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] anyhow::Error),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Retrieval panicked: {0}")]
    Panicked(String),
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vector index trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::IndexError;

/// Metadata key holding the snippet text
pub const TEXT_METADATA_KEY: &str = "text";

/// One nearest-neighbour hit returned by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl IndexMatch {
    /// Snippet text stored with the vector; empty when the field is
    /// missing or not a string
    pub fn text(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(TEXT_METADATA_KEY))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Similarity search over stored embeddings
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns up to `top_k` matches for `vector`, best first, with metadata
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>, IndexError>;

    /// Index name for logging
    fn name(&self) -> &str;
}

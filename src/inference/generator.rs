// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reply generation on top of the loaded language model

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;

use super::engine::{GenerationParams, TextGenerator};
use super::prompt::build_prompt;
use crate::utils::panic_message;

/// Reply when no language model is loaded
pub const OFFLINE_MESSAGE: &str = "Thinking module offline. Please check model configuration.";

/// Prefix of replies that carry a generation failure
pub const ERROR_PREFIX: &str = "Error computing response:";

/// Produces JARVIS replies
///
/// Always answers with text: the offline notice when no model is loaded,
/// the trimmed completion on success, and `"Error computing response: ..."`
/// when inference fails.
#[derive(Clone)]
pub struct ResponseGenerator {
    model: Option<Arc<dyn TextGenerator>>,
    params: GenerationParams,
}

impl ResponseGenerator {
    pub fn new(model: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            model,
            params: GenerationParams::default(),
        }
    }

    /// Generator with no model loaded
    pub fn offline() -> Self {
        Self::new(None)
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub async fn generate(&self, query: &str, context: &str) -> String {
        let model = match &self.model {
            Some(model) => model,
            None => return OFFLINE_MESSAGE.to_string(),
        };

        let prompt = build_prompt(query, context);
        let completion = AssertUnwindSafe(model.complete(&prompt, &self.params))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(anyhow::anyhow!(
                    "generation panicked: {}",
                    panic_message(panic.as_ref())
                ))
            });

        match completion {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                error!("Generation with {} failed: {:#}", model.model_name(), e);
                format!("{} {:#}", ERROR_PREFIX, e)
            }
        }
    }
}

impl std::fmt::Debug for ResponseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseGenerator")
            .field("model", &self.model.as_ref().map(|m| m.model_name()))
            .field("params", &self.params)
            .finish()
    }
}

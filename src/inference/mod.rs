// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Local language model: discovery, loading, prompting and generation
pub mod engine;
pub mod generator;
pub mod loader;
pub mod prompt;
pub mod stop;

pub use engine::{GenerationParams, LlmEngine, TextGenerator, MAX_NEW_TOKENS, TEMPERATURE};
pub use generator::{ResponseGenerator, ERROR_PREFIX, OFFLINE_MESSAGE};
pub use loader::{discover_models, find_model};
pub use prompt::{build_prompt, SYSTEM_PROMPT};

use crate::config::EngineConfig;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Loads the first GGUF model in the configured directory
///
/// Returns `None` (after logging) when no model file exists or loading
/// fails; startup continues either way.
pub async fn init_model(config: &EngineConfig) -> Option<Arc<dyn TextGenerator>> {
    let model_path = match find_model(&config.models_directory) {
        Some(path) => path,
        None => {
            warn!(
                "No GGUF model found in '{}' directory. LLM will not work.",
                config.models_directory.display()
            );
            return None;
        }
    };

    info!("Loading Local LLM from: {}", model_path.display());
    let engine_config = config.clone();
    let loaded =
        tokio::task::spawn_blocking(move || LlmEngine::load(&model_path, &engine_config)).await;

    match loaded {
        Ok(Ok(engine)) => {
            info!(
                "Local LLM Loaded Successfully ({} tokens context, {} GPU layers requested)",
                engine.context_size(),
                config.gpu_layers
            );
            Some(Arc::new(engine))
        }
        Ok(Err(e)) => {
            error!("Failed to load LLM: {:#}", e);
            None
        }
        Err(e) => {
            error!("Failed to load LLM: loader task failed: {}", e);
            None
        }
    }
}

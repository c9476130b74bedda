// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use llama_cpp_2::{
    context::params::LlamaContextParams,
    llama_backend::LlamaBackend,
    llama_batch::LlamaBatch,
    model::{params::LlamaModelParams, AddBos, LlamaModel, Special},
    sampling::LlamaSampler,
};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::stop::{find_stop, truncate_at_stop};
use crate::config::EngineConfig;
use crate::utils::panic_message;

/// Token budget for one reply
pub const MAX_NEW_TOKENS: usize = 256;

/// Sampling temperature for replies
pub const TEMPERATURE: f32 = 0.7;

/// Sanitize prompt text for tokenization
///
/// Removes characters that break C string handling in llama.cpp: NUL bytes
/// and C0 control characters other than tab, newline and carriage return.
fn sanitize_prompt_for_tokenizer(prompt: &str) -> String {
    prompt
        .chars()
        .filter(|c| *c != '\0' && (*c >= ' ' || *c == '\t' || *c == '\n' || *c == '\r'))
        .collect()
}

/// Position at which generation must stop
///
/// The token budget shrinks to whatever room the context window has left
/// after the prompt. Only a prompt that fills the window on its own is an
/// error.
fn generation_limit(prompt_tokens: usize, max_tokens: usize, context_size: usize) -> Result<usize> {
    if prompt_tokens >= context_size {
        bail!(
            "Prompt ({} tokens) exceeds context window of {}",
            prompt_tokens,
            context_size
        );
    }
    Ok((prompt_tokens + max_tokens).min(context_size))
}

/// Sampling and stopping parameters for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_k: i32,
    pub top_p: f32,
    pub stop_sequences: Vec<String>,
    /// Fixed RNG seed; a fresh random seed is drawn per call when `None`
    pub seed: Option<u32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: MAX_NEW_TOKENS,
            temperature: TEMPERATURE,
            top_k: 40,
            top_p: 0.95,
            stop_sequences: vec!["User:".to_string(), "\n".to_string()],
            seed: None,
        }
    }
}

/// A loaded language model that completes prompts
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the raw completion of `prompt`, already cut at the first
    /// stop sequence
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

/// llama.cpp engine holding one GGUF model
///
/// The model is read-only after loading; each completion builds its own
/// llama context on the blocking thread pool.
#[derive(Clone)]
pub struct LlmEngine {
    backend: Arc<LlamaBackend>,
    model: Arc<LlamaModel>,
    model_name: String,
    context_size: u32,
    batch_size: u32,
}

impl std::fmt::Debug for LlmEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmEngine")
            .field("model_name", &self.model_name)
            .field("context_size", &self.context_size)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl LlmEngine {
    /// Loads a GGUF model from disk. Blocking.
    pub fn load(model_path: &Path, config: &EngineConfig) -> Result<Self> {
        let backend =
            LlamaBackend::init().map_err(|e| anyhow!("Failed to initialize backend: {:?}", e))?;

        let model_params = LlamaModelParams::default().with_n_gpu_layers(config.gpu_layers);
        let model = LlamaModel::load_from_file(&backend, model_path, &model_params)
            .map_err(|e| anyhow!("Failed to load model: {:?}", e))?;

        let model_name = model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.display().to_string());

        Ok(Self {
            backend: Arc::new(backend),
            model: Arc::new(model),
            model_name,
            context_size: config.context_size.max(1),
            batch_size: config.batch_size.max(1),
        })
    }

    pub fn context_size(&self) -> u32 {
        self.context_size
    }

    /// Runs one completion on the calling thread
    pub fn complete_blocking(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let start_time = Instant::now();

        let sanitized_prompt = sanitize_prompt_for_tokenizer(prompt);
        let prompt_tokens = self
            .model
            .str_to_token(&sanitized_prompt, AddBos::Always)
            .map_err(|e| anyhow!("Failed to tokenize: {:?}", e))?;
        if prompt_tokens.is_empty() {
            bail!("Prompt produced no tokens");
        }

        let limit = generation_limit(
            prompt_tokens.len(),
            params.max_tokens,
            self.context_size as usize,
        )?;

        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(self.context_size))
            .with_n_batch(self.batch_size);
        let mut context = self
            .model
            .new_context(&self.backend, ctx_params)
            .map_err(|e| anyhow!("Failed to create context: {:?}", e))?;

        // Prompt evaluation in batch-sized chunks; only the final token needs logits.
        let mut batch = LlamaBatch::new(self.batch_size as usize, 1);
        let last_index = prompt_tokens.len() - 1;
        for (chunk_no, chunk) in prompt_tokens.chunks(self.batch_size as usize).enumerate() {
            batch.clear();
            let offset = chunk_no * self.batch_size as usize;
            for (i, &token) in chunk.iter().enumerate() {
                let pos = offset + i;
                batch
                    .add(token, pos as i32, &[0], pos == last_index)
                    .map_err(|e| anyhow!("Failed to add token to batch: {:?}", e))?;
            }
            context
                .decode(&mut batch)
                .map_err(|e| anyhow!("Decode failed: {:?}", e))?;
        }

        let seed = params.seed.unwrap_or_else(rand::random);
        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::top_k(params.top_k),
            LlamaSampler::top_p(params.top_p, 1),
            LlamaSampler::temp(params.temperature),
            LlamaSampler::dist(seed),
        ]);

        let eos_token = self.model.token_eos();
        let mut bytes: Vec<u8> = Vec::new();
        let mut n_cur = prompt_tokens.len();
        let mut stop_reason = "max_tokens";

        while n_cur < limit {
            let token = sampler.sample(&context, -1);
            if token == eos_token {
                stop_reason = "eos_token";
                break;
            }

            // Multi-byte characters may span tokens, so decode the whole buffer each step.
            let piece = self
                .model
                .token_to_bytes(token, Special::Plaintext)
                .map_err(|e| anyhow!("Failed to detokenize: {:?}", e))?;
            bytes.extend_from_slice(&piece);
            if find_stop(&String::from_utf8_lossy(&bytes), &params.stop_sequences).is_some() {
                stop_reason = "stop_sequence";
                break;
            }

            batch.clear();
            batch
                .add(token, n_cur as i32, &[0], true)
                .map_err(|e| anyhow!("Failed to add token: {:?}", e))?;
            context
                .decode(&mut batch)
                .map_err(|e| anyhow!("Decode failed: {:?}", e))?;
            n_cur += 1;
        }

        let mut output = String::from_utf8_lossy(&bytes).into_owned();
        truncate_at_stop(&mut output, &params.stop_sequences);

        info!(
            prompt_tokens = prompt_tokens.len(),
            generated_tokens = n_cur - prompt_tokens.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            stop_reason,
            "Generation finished"
        );
        Ok(output)
    }
}

#[async_trait]
impl TextGenerator for LlmEngine {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let engine = self.clone();
        let prompt = prompt.to_string();
        let params = params.clone();
        debug!(prompt_chars = prompt.len(), "Scheduling completion");

        tokio::task::spawn_blocking(move || engine.complete_blocking(&prompt, &params))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    anyhow!("inference panicked: {}", panic_message(e.into_panic().as_ref()))
                } else {
                    anyhow!("inference task cancelled")
                }
            })?
            .context("llama.cpp generation failed")
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

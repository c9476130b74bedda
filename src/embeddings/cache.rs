// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Locates the all-MiniLM-L6-v2 ONNX files on disk, fetching them from
//! HuggingFace Hub on first start.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::errors::EmbeddingError;
use crate::config::EmbeddingConfig;

/// ONNX export inside the sentence-transformers repository
pub const REMOTE_MODEL_FILE: &str = "onnx/model.onnx";

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Paths to the files an `OnnxEmbeddingModel` is built from
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

impl ModelFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join(MODEL_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
        }
    }

    pub fn exist(&self) -> bool {
        self.model.exists() && self.tokenizer.exists()
    }
}

/// Returns the model files, downloading whatever is missing unless the
/// config is offline.
///
/// Blocking: call from `spawn_blocking` in async code.
pub fn get_or_download_model(config: &EmbeddingConfig) -> Result<ModelFiles, EmbeddingError> {
    let files = ModelFiles::in_dir(&config.model_dir);

    if files.exist() {
        debug!(path = ?config.model_dir, "Using cached embedding model");
        return Ok(files);
    }

    if config.offline {
        let missing = if files.model.exists() {
            &files.tokenizer
        } else {
            &files.model
        };
        return Err(EmbeddingError::FileNotFound(missing.display().to_string()));
    }

    info!(repo = %config.repo_id, "Downloading embedding model files...");
    download_model_files(config, &files)?;
    Ok(files)
}

fn download_model_files(config: &EmbeddingConfig, files: &ModelFiles) -> Result<(), EmbeddingError> {
    use hf_hub::api::sync::Api;

    let download_error = |file: &str, message: String| EmbeddingError::Download {
        repo: config.repo_id.clone(),
        file: file.to_string(),
        message,
    };

    let api = Api::new().map_err(|e| download_error(REMOTE_MODEL_FILE, e.to_string()))?;
    let repo = api.model(config.repo_id.clone());

    std::fs::create_dir_all(&config.model_dir)?;

    for (remote, local) in [
        (REMOTE_MODEL_FILE, &files.model),
        (TOKENIZER_FILE, &files.tokenizer),
    ] {
        if local.exists() {
            continue;
        }
        info!(file = remote, "Downloading...");
        let source = repo
            .get(remote)
            .map_err(|e| download_error(remote, e.to_string()))?;
        std::fs::copy(&source, local)?;
        debug!(file = remote, "Copied to {:?}", local);
    }

    Ok(())
}

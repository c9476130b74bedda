// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Every setting can be given as a command-line flag or read from the
//! environment (a `.env` file is loaded before parsing). Missing optional
//! values never fail startup; they put the matching subsystem into
//! degraded mode instead.

use clap::{Args, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default Pinecone region when `PINECONE_ENV` is unset
pub const DEFAULT_PINECONE_ENV: &str = "us-east-1";

/// Default Pinecone index when `PINECONE_INDEX_NAME` is unset
pub const DEFAULT_INDEX_NAME: &str = "jarvis-knowledge";

/// HuggingFace repository of the sentence embedding model
pub const DEFAULT_EMBEDDING_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Top-level configuration for the JARVIS node
#[derive(Parser, Debug, Clone)]
#[command(name = "jarvis-rag-node")]
#[command(about = "Retrieval-augmented chat backend with local GGUF inference", long_about = None)]
pub struct NodeConfig {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP listener
    #[arg(long, env = "API_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory holding index.html and the frontend assets
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    #[command(flatten)]
    pub knowledge_base: KnowledgeBaseConfig,

    #[command(flatten)]
    pub engine: EngineConfig,

    #[command(flatten)]
    pub embedding: EmbeddingConfig,
}

impl NodeConfig {
    /// Socket address the API server listens on
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
            knowledge_base: KnowledgeBaseConfig::default(),
            engine: EngineConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Pinecone connection settings
#[derive(Args, Clone)]
pub struct KnowledgeBaseConfig {
    /// Pinecone API key; retrieval is disabled without it
    #[arg(long = "pinecone-api-key", env = "PINECONE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Region the index is expected to live in
    #[arg(long = "pinecone-env", env = "PINECONE_ENV", default_value = DEFAULT_PINECONE_ENV)]
    pub environment: String,

    /// Name of the Pinecone index holding the knowledge base
    #[arg(long = "pinecone-index", env = "PINECONE_INDEX_NAME", default_value = DEFAULT_INDEX_NAME)]
    pub index_name: String,

    /// Data-plane host of the index; looked up through the control plane when unset
    #[arg(long = "pinecone-host", env = "PINECONE_INDEX_HOST")]
    pub index_host: Option<String>,

    /// Namespace to query inside the index
    #[arg(long = "pinecone-namespace", env = "PINECONE_NAMESPACE")]
    pub namespace: Option<String>,
}

impl KnowledgeBaseConfig {
    /// Returns the API key if one was provided and it is not blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            environment: DEFAULT_PINECONE_ENV.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            index_host: None,
            namespace: None,
        }
    }
}

// Hand-written so the API key never reaches the logs.
impl std::fmt::Debug for KnowledgeBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseConfig")
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("environment", &self.environment)
            .field("index_name", &self.index_name)
            .field("index_host", &self.index_host)
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// llama.cpp inference settings
#[derive(Args, Debug, Clone)]
pub struct EngineConfig {
    /// Directory scanned for `*.gguf` model files
    #[arg(long, env = "MODELS_DIR", default_value = "models")]
    pub models_directory: PathBuf,

    /// Context window of the loaded model, in tokens
    #[arg(long, env = "CONTEXT_SIZE", default_value_t = 2048)]
    pub context_size: u32,

    /// Layers offloaded to the GPU (values above the layer count offload everything)
    #[arg(long, env = "GPU_LAYERS", default_value_t = 999)]
    pub gpu_layers: u32,

    /// Prompt evaluation batch size, in tokens
    #[arg(long, env = "LLAMA_BATCH_SIZE", default_value_t = 512)]
    pub batch_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models_directory: PathBuf::from("models"),
            context_size: 2048,
            gpu_layers: 999,
            batch_size: 512,
        }
    }
}

/// Sentence embedding model settings
#[derive(Args, Debug, Clone)]
pub struct EmbeddingConfig {
    /// Directory containing `model.onnx` and `tokenizer.json`
    #[arg(long, env = "EMBEDDING_MODEL_DIR", default_value = "models/all-MiniLM-L6-v2-onnx")]
    pub model_dir: PathBuf,

    /// HuggingFace repository used to fetch missing model files
    #[arg(long, env = "EMBEDDING_MODEL_REPO", default_value = DEFAULT_EMBEDDING_REPO)]
    pub repo_id: String,

    /// Skip the HuggingFace download when files are missing
    #[arg(long, env = "EMBEDDING_OFFLINE")]
    pub offline: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2-onnx"),
            repo_id: DEFAULT_EMBEDDING_REPO.to_string(),
            offline: false,
        }
    }
}

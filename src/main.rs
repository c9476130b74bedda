// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use jarvis_rag_node::{
    api::{self, AppState},
    config::NodeConfig,
    embeddings::init_encoder,
    inference::{init_model, ResponseGenerator},
    orchestrator::RequestOrchestrator,
    rag::{connect_knowledge_base, KnowledgeRetriever},
    version,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables take precedence
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = NodeConfig::parse();
    let addr = config.listen_addr()?;

    println!("🚀 Starting JARVIS RAG Node...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    println!("📚 Connecting to knowledge base...");
    let index = connect_knowledge_base(&config.knowledge_base).await;
    let encoder = init_encoder(&config.embedding).await;
    let retriever = KnowledgeRetriever::new(index, encoder);
    if retriever.is_available() {
        println!("✅ Knowledge base ready ({})", config.knowledge_base.index_name);
    } else {
        println!("⚠️  Knowledge base unavailable, answering without context");
    }

    println!("🧠 Loading local LLM...");
    let generator = ResponseGenerator::new(init_model(&config.engine).await);
    if generator.is_available() {
        println!("✅ Local LLM ready");
    } else {
        println!("⚠️  No local LLM loaded, chat replies will report the module offline");
    }

    let orchestrator = RequestOrchestrator::new(retriever, generator);
    let state = Arc::new(AppState::new(orchestrator, config.static_dir.clone()));

    println!();
    println!("🌐 JARVIS listening on http://{}", addr);
    println!("   POST /chat   - ask JARVIS");
    println!("   GET  /health - subsystem status");
    println!("   Press Ctrl+C to stop\n");
    info!("{}", version::get_version_string());

    api::serve(addr, state).await
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response generation with a scripted language model

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use jarvis_rag_node::inference::{
    build_prompt, GenerationParams, ResponseGenerator, TextGenerator, ERROR_PREFIX,
    OFFLINE_MESSAGE, SYSTEM_PROMPT,
};
use std::sync::{Arc, Mutex};

enum Script {
    Reply(&'static str),
    Fail(&'static str),
    Panic,
}

struct ScriptedModel {
    script: Script,
    prompts: Mutex<Vec<String>>,
    params: Mutex<Vec<GenerationParams>>,
}

impl ScriptedModel {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.params.lock().unwrap().push(params.clone());
        match self.script {
            Script::Reply(text) => Ok(text.to_string()),
            Script::Fail(message) => Err(anyhow!(message)),
            Script::Panic => panic!("llama context corrupted"),
        }
    }

    fn model_name(&self) -> &str {
        "scripted.gguf"
    }
}

fn generator(model: &Arc<ScriptedModel>) -> ResponseGenerator {
    ResponseGenerator::new(Some(model.clone()))
}

#[tokio::test]
async fn test_offline_without_model() {
    let generator = ResponseGenerator::offline();
    assert_eq!(generator.generate("Hello", "").await, OFFLINE_MESSAGE);
    assert_eq!(
        OFFLINE_MESSAGE,
        "Thinking module offline. Please check model configuration."
    );
}

#[tokio::test]
async fn test_reply_trimmed() {
    let model = ScriptedModel::new(Script::Reply(" Good evening, sir. "));
    assert_eq!(generator(&model).generate("Hello", "").await, "Good evening, sir.");
}

#[tokio::test]
async fn test_prompt_without_context() {
    let model = ScriptedModel::new(Script::Reply("Yes."));
    generator(&model).generate("Are you there?", "").await;

    let prompt = model.last_prompt();
    assert_eq!(prompt, build_prompt("Are you there?", ""));
    assert!(prompt.starts_with(SYSTEM_PROMPT));
    assert!(!prompt.contains("Context Information:"));
    assert!(prompt.ends_with("User: Are you there?\nJARVIS:"));
}

#[tokio::test]
async fn test_prompt_with_context() {
    let model = ScriptedModel::new(Script::Reply("Malibu."));
    generator(&model)
        .generate("Where is the workshop?", "The workshop is in Malibu.")
        .await;

    let prompt = model.last_prompt();
    assert!(prompt.contains("Context Information:\nThe workshop is in Malibu.\n\nUser: Where is the workshop?\nJARVIS:"));
}

#[tokio::test]
async fn test_default_params_passed() {
    let model = ScriptedModel::new(Script::Reply("ok"));
    generator(&model).generate("ping", "").await;

    let params = model.params.lock().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0], GenerationParams::default());
    assert_eq!(params[0].max_tokens, 256);
    assert_eq!(params[0].stop_sequences, vec!["User:".to_string(), "\n".to_string()]);
}

#[tokio::test]
async fn test_error_becomes_reply_text() {
    let model = ScriptedModel::new(Script::Fail("context window exceeded"));
    let reply = generator(&model).generate("hello", "").await;

    assert!(reply.starts_with(ERROR_PREFIX));
    assert_eq!(reply, "Error computing response: context window exceeded");
}

#[tokio::test]
async fn test_panic_becomes_reply_text() {
    let model = ScriptedModel::new(Script::Panic);
    let reply = generator(&model).generate("hello", "").await;

    assert!(reply.starts_with("Error computing response: "));
    assert!(reply.contains("llama context corrupted"));
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JARVIS prompt construction

/// Persona preamble placed at the top of every prompt
pub const SYSTEM_PROMPT: &str = "You are JARVIS, a highly advanced AI assistant. \n\
Your personality is helpful, polite, and precise. \n\
If context is provided, use it to answer the question. \n\
If you don't know the answer, say so elegantly.";

/// Heading introducing retrieved knowledge inside the prompt
pub const CONTEXT_HEADER: &str = "Context Information:";

/// Speaker labels of the completion transcript
pub const USER_LABEL: &str = "User:";
pub const ASSISTANT_LABEL: &str = "JARVIS:";

/// Builds the completion prompt for `query`
///
/// The context section is included only when `context` is non-empty; the
/// prompt always ends with the assistant label so the model answers in
/// character.
pub fn build_prompt(query: &str, context: &str) -> String {
    if context.is_empty() {
        format!("{SYSTEM_PROMPT}\n\n{USER_LABEL} {query}\n{ASSISTANT_LABEL}")
    } else {
        format!(
            "{SYSTEM_PROMPT}\n\n{CONTEXT_HEADER}\n{context}\n\n{USER_LABEL} {query}\n{ASSISTANT_LABEL}"
        )
    }
}

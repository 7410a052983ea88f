pub mod config;
pub mod db;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod ratelimit;
pub mod routes;
pub mod screening;
pub mod state;

use std::sync::Arc;

use crate::screening::archive::TranscriptArchive;
use crate::screening::assistant::{FallbackAssistant, LlmAssistant, ScreeningAssistant};
use crate::screening::engine::ScreeningEngine;

/// Builds the assistant chain: the LLM first when a key is given, the rules otherwise.
pub fn build_assistant(api_key: Option<&str>) -> anyhow::Result<FallbackAssistant> {
    let primary: Option<Arc<dyn ScreeningAssistant>> = match api_key {
        Some(key) => Some(Arc::new(LlmAssistant(llm_client::LlmClient::new(
            key.to_string(),
        )?))),
        None => None,
    };
    Ok(FallbackAssistant::new(primary))
}

/// Engine wired with the given assistant key, archive and limits.
pub fn build_engine(
    api_key: Option<&str>,
    archive: Arc<dyn TranscriptArchive>,
    question_count: usize,
    history_limit: usize,
) -> anyhow::Result<ScreeningEngine> {
    Ok(ScreeningEngine::new(build_assistant(api_key)?, archive)
        .with_question_count(question_count)
        .with_history_limit(history_limit))
}

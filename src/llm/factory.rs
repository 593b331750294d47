//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating completion clients.

use std::sync::Arc;

use crate::config::LlmSettings;
use crate::error::{Result, ScoutError};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Creates a completion client from resolved settings.
///
/// For OpenAI, the API key is resolved in order:
/// 1. `settings.api_key` (from config file or CLI)
/// 2. The `OPENAI_API_KEY` environment variable
pub fn create_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>> {
    match settings.provider {
        LlmProvider::OpenAi => {
            let key = settings
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .ok_or_else(|| {
                    ScoutError::config("No API key configured. Set OPENAI_API_KEY.")
                })?;
            let config = OpenAiConfig::new(key, settings.model.clone())
                .with_max_retries(settings.max_retries);
            Ok(Arc::new(OpenAiClient::new(config)?))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}

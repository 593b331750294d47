//! Mock LLM clients for testing.
//!
//! Provides deterministic responses based on input patterns and records
//! every request so prompt construction can be asserted on.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{Result, ScoutError};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit testing without making real API calls. Every request is
/// captured and can be inspected afterwards via [`MockLlmClient::requests`].
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// Fallback response when no pattern matches.
    default_response: Option<String>,
    /// All message lists this client has been called with.
    captured: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When any message in the request contains `pattern`, the mock will
    /// return `response`. Patterns are checked in insertion order.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Sets the response returned when no pattern matches.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }

    /// Returns a copy of every request this client has received.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.captured.lock().expect("mock lock poisoned").clone()
    }

    /// Returns the number of completion calls made.
    pub fn call_count(&self) -> usize {
        self.captured.lock().expect("mock lock poisoned").len()
    }

    /// Generates a mock response based on the full request content.
    fn mock_response(&self, messages: &[Message]) -> String {
        let haystack = messages
            .iter()
            .map(|m| m.content.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");

        // Check custom responses first
        for (pattern, response) in &self.custom_responses {
            if haystack.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if let Some(ref response) = self.default_response {
            return response.clone();
        }

        // Default pattern matching for common analytics questions
        if haystack.contains("signup") {
            return "SELECT COUNT(*) FROM signup".to_string();
        }

        if haystack.contains("search") {
            return "SELECT searchTerm, COUNT(*) FROM search_bar GROUP BY searchTerm".to_string();
        }

        if haystack.contains("session") {
            return "SELECT COUNT(*) FROM sessions".to_string();
        }

        "SELECT 1".to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.captured
            .lock()
            .expect("mock lock poisoned")
            .push(messages.to_vec());
        Ok(self.mock_response(messages))
    }
}

/// Mock LLM client that fails every request.
#[derive(Debug, Clone)]
pub struct FailingLlmClient {
    message: String,
}

impl FailingLlmClient {
    /// Creates a failing client with a fixed error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingLlmClient {
    fn default() -> Self {
        Self::new("completion service unavailable")
    }
}

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String> {
        Err(ScoutError::generation(self.message.clone()))
    }
}

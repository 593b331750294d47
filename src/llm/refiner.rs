//! Query revision after negative feedback.
//!
//! Builds a revision prompt from the original question, the rejected query,
//! and the last execution error when one was retained.

use std::sync::Arc;

use crate::error::{Result, ScoutError};
use crate::llm::generator::strip_sql_label;
use crate::llm::types::Message;
use crate::llm::LlmClient;
use crate::schema::SchemaContext;

/// Produces a revised SQL query for a question the user rejected.
///
/// Output is not reproducible call-to-call; the completion client pins
/// temperature to its most deterministic setting but callers must not
/// assume identical inputs give identical queries.
pub struct QueryRefiner {
    client: Arc<dyn LlmClient>,
    schema: SchemaContext,
}

impl QueryRefiner {
    /// Creates a refiner over the given completion client and schema.
    pub fn new(client: Arc<dyn LlmClient>, schema: SchemaContext) -> Self {
        Self { client, schema }
    }

    /// Builds the revision request.
    fn build_messages(
        &self,
        question: &str,
        prior_sql: &str,
        last_error: Option<&str>,
    ) -> Vec<Message> {
        let error_context = match last_error {
            Some(err) => format!("\nPrevious error: {err}"),
            None => String::new(),
        };

        let system = format!(
            "You are an SQL expert. A user was not satisfied with a previous \
             SQL query.\n\
             Original question: {question}\n\
             Original query: {prior_sql}{error_context}\n\
             Please generate an improved SQL query that might better answer \
             their question and avoid the previous error if any.\n\
             Generate ONLY the SQL query without any text or 'SQL:' prefix.\n\n{}",
            self.schema.text()
        );

        vec![
            Message::system(system),
            Message::user("Please generate an improved version of this SQL query."),
        ]
    }

    /// Generates a revised query from the prior query and retained error.
    ///
    /// On failure the caller's prior query remains valid; this method never
    /// consumes it.
    pub async fn refine(
        &self,
        question: &str,
        prior_sql: &str,
        last_error: Option<&str>,
    ) -> Result<String> {
        let messages = self.build_messages(question, prior_sql, last_error);
        let response = self.client.complete(&messages).await?;

        let sql = strip_sql_label(&response);
        if sql.is_empty() {
            return Err(ScoutError::generation(
                "Completion service returned an empty query",
            ));
        }

        Ok(sql.to_string())
    }
}

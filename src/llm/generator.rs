//! SQL generation from natural-language questions.
//!
//! Builds a grounded system/human message pair, invokes the completion
//! client, and sanitizes the response into plain SQL text.

use std::sync::Arc;

use crate::error::{Result, ScoutError};
use crate::llm::types::Message;
use crate::llm::LlmClient;
use crate::schema::SchemaContext;

/// Strips a leading "SQL:" label from a completion response.
///
/// Case-insensitive; repeated labels are all removed so a second
/// application is a no-op.
pub fn strip_sql_label(text: &str) -> &str {
    let mut rest = text.trim();
    while rest
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("sql:"))
    {
        rest = rest[4..].trim_start();
    }
    rest.trim_end()
}

/// Generates SQL for a question against the fixed schema context.
pub struct QueryGenerator {
    client: Arc<dyn LlmClient>,
    schema: SchemaContext,
}

impl QueryGenerator {
    /// Creates a generator over the given completion client and schema.
    pub fn new(client: Arc<dyn LlmClient>, schema: SchemaContext) -> Self {
        Self { client, schema }
    }

    /// Builds the two-message request for a question.
    fn build_messages(&self, question: &str) -> Vec<Message> {
        let system = format!(
            "You are an SQL expert. Generate ONLY the SQL query without any \
             text or 'SQL:' prefix.\n\n{}",
            self.schema.text()
        );
        vec![Message::system(system), Message::user(question)]
    }

    /// Generates a SQL query for the given question.
    ///
    /// Returns non-empty SQL text or a generation error; never an empty
    /// success. Retries, if any, live inside the completion client.
    pub async fn generate(&self, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(ScoutError::generation("Question must not be empty"));
        }

        let messages = self.build_messages(question);
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

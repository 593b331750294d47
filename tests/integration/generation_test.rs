//! Prompt construction and sanitization properties.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use sql_scout::llm::{strip_sql_label, MockLlmClient, QueryGenerator, QueryRefiner, Role};
use sql_scout::schema::SchemaContext;

#[tokio::test]
async fn generated_queries_are_never_empty_on_success() {
    let client = Arc::new(MockLlmClient::new());
    let generator = QueryGenerator::new(client.clone(), SchemaContext::builtin());

    for question in [
        "How many signups last week?",
        "What are the most common search terms?",
        "How long do sessions from organic traffic last?",
    ] {
        let sql = generator.generate(question).await.unwrap();
        assert!(!sql.trim().is_empty(), "empty SQL for question {question:?}");
    }
}

#[tokio::test]
async fn empty_completion_is_an_error_not_an_empty_success() {
    let client = Arc::new(MockLlmClient::new().with_default_response("  SQL:   "));
    let generator = QueryGenerator::new(client, SchemaContext::builtin());

    let result = generator.generate("How many signups?").await;
    assert!(result.is_err());
}

#[test]
fn label_strip_is_idempotent_across_inputs() {
    for raw in [
        "SQL: SELECT 1",
        "sql:SELECT 1",
        "SQL: SQL: SELECT 1",
        "SELECT 1",
        "  SELECT 1  ",
        "",
    ] {
        let once = strip_sql_label(raw);
        let twice = strip_sql_label(once);
        assert_eq!(once, twice, "strip not idempotent for {raw:?}");
    }
}

#[tokio::test]
async fn generation_prompt_grounds_on_the_schema_blob() {
    let client = Arc::new(MockLlmClient::new());
    let schema = SchemaContext::new("Table: widgets\n  Columns: id, name.");
    let generator = QueryGenerator::new(client.clone(), schema);

    generator.generate("How many widgets?").await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let system = &requests[0][0];
    assert_eq!(system.role, Role::System);
    assert!(system.content.contains("Table: widgets"));
    assert_eq!(requests[0][1].content, "How many widgets?");
}

#[tokio::test]
async fn refinement_prompt_carries_question_prior_query_and_schema() {
    let client = Arc::new(MockLlmClient::new());
    let schema = SchemaContext::new("Table: widgets\n  Columns: id, name.");
    let refiner = QueryRefiner::new(client.clone(), schema);

    refiner
        .refine(
            "How many widgets?",
            "SELECT COUNT(*) FROM widget",
            Some("Table 'shop.widget' doesn't exist"),
        )
        .await
        .unwrap();

    let system = &client.requests()[0][0].content;
    assert!(system.contains("How many widgets?"));
    assert!(system.contains("SELECT COUNT(*) FROM widget"));
    assert!(system.contains("Table 'shop.widget' doesn't exist"));
    assert!(system.contains("Table: widgets"));
}

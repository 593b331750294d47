//! End-to-end tests for the question/execute/feedback loop.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use sql_scout::app::{Assistant, FeedbackOutcome};
use sql_scout::db::{FailingExecutor, MockExecutor, SqlExecutor};
use sql_scout::error::ExecutionErrorKind;
use sql_scout::feedback::MemoryFeedbackStore;
use sql_scout::llm::{LlmClient, MockLlmClient};
use sql_scout::schema::SchemaContext;
use sql_scout::session::{Phase, QuerySlot};

const SIGNUP_SQL: &str = "SELECT COUNT(*) FROM signup WHERE timestamp >= NOW() - INTERVAL 7 DAY";

fn harness(
    client: Arc<MockLlmClient>,
    executor: Arc<dyn SqlExecutor>,
) -> (Assistant, MemoryFeedbackStore) {
    let store = MemoryFeedbackStore::new();
    let assistant = Assistant::new(
        client,
        SchemaContext::builtin(),
        executor,
        Arc::new(store.clone()),
    );
    (assistant, store)
}

#[tokio::test]
async fn question_to_stripped_query() {
    let client =
        Arc::new(MockLlmClient::new().with_default_response(format!("SQL: {SIGNUP_SQL}")));
    let (mut assistant, _) = harness(client, Arc::new(MockExecutor::new()));

    let sql = assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();

    assert_eq!(sql, SIGNUP_SQL);
    assert_eq!(assistant.current_sql(), Some(SIGNUP_SQL));
    assert_eq!(assistant.phase(), Phase::Generated);
}

#[tokio::test]
async fn execute_is_explicit_and_runs_current_query() {
    let client = Arc::new(MockLlmClient::new().with_default_response(SIGNUP_SQL));
    let executor = Arc::new(MockExecutor::new());
    let (mut assistant, _) = harness(client, executor.clone());

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();

    // Generation alone must not execute anything.
    assert!(executor.executed().is_empty());

    let result = assistant.execute_current().await.unwrap();

    assert_eq!(executor.executed(), vec![SIGNUP_SQL]);
    assert_eq!(result.row_count, 1);
    assert_eq!(assistant.phase(), Phase::Executed);
}

#[tokio::test]
async fn execution_failure_is_retained_and_does_not_block_feedback() {
    let client = Arc::new(MockLlmClient::new().with_default_response(SIGNUP_SQL));
    let executor = Arc::new(FailingExecutor::syntax("Table 'tracker.signups' doesn't exist"));
    let (mut assistant, store) = harness(client, executor);

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();
    let err = assistant.execute_current().await.unwrap_err();

    assert_eq!(err.category(), "Execution Error");
    assert_eq!(assistant.phase(), Phase::ExecutionFailed);

    let failure = assistant.last_error().unwrap();
    assert_eq!(failure.kind, ExecutionErrorKind::Syntax);
    assert!(failure.message.contains("doesn't exist"));

    // Feedback is still collectable after a failed run.
    assistant.record_feedback(false).await.unwrap();
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn new_question_resets_all_derived_state() {
    let client = Arc::new(MockLlmClient::new());
    let executor = Arc::new(FailingExecutor::syntax("bad column"));
    let (mut assistant, _) = harness(client, executor);

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();
    assistant.execute_current().await.unwrap_err();
    assistant.record_feedback(false).await.unwrap();

    assert!(assistant.refined_sql().is_some());
    assert!(assistant.last_error().is_some());

    assistant
        .submit_question("How many sessions came from paid campaigns?")
        .await
        .unwrap();

    assert_eq!(assistant.phase(), Phase::Generated);
    assert_eq!(assistant.refined_sql(), None);
    assert!(assistant.last_error().is_none());
    assert!(!assistant.feedback_given());
    assert_eq!(
        assistant.question(),
        Some("How many sessions came from paid campaigns?")
    );
}

#[tokio::test]
async fn generation_failure_is_terminal_for_the_question() {
    let client: Arc<dyn LlmClient> =
        Arc::new(sql_scout::llm::FailingLlmClient::new("service down"));
    let store = MemoryFeedbackStore::new();
    let mut assistant = Assistant::new(
        client,
        SchemaContext::builtin(),
        Arc::new(MockExecutor::new()),
        Arc::new(store.clone()),
    );

    let err = assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Generation Error");
    assert_eq!(assistant.phase(), Phase::GenerationFailed);
    assert_eq!(assistant.current_sql(), None);

    // Nothing to execute, nothing to judge.
    assert!(assistant.execute_current().await.is_err());
    assert!(assistant.record_feedback(true).await.is_err());
    assert!(store.is_empty());

    // A new question recovers the session.
    let client = Arc::new(MockLlmClient::new());
    let mut assistant = Assistant::new(
        client,
        SchemaContext::builtin(),
        Arc::new(MockExecutor::new()),
        Arc::new(MemoryFeedbackStore::new()),
    );
    assistant.submit_question("How many sessions?").await.unwrap();
    assert_eq!(assistant.phase(), Phase::Generated);
}

#[tokio::test]
async fn original_and_refined_queries_stay_independently_executable() {
    let client = Arc::new(
        MockLlmClient::new()
            .with_response("not satisfied", "SELECT COUNT(*) FROM signup")
            .with_default_response("SELECT COUNT(*) FROM signups"),
    );
    let executor = Arc::new(MockExecutor::new());
    let (mut assistant, _) = harness(client, executor.clone());

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();
    assistant.record_feedback(false).await.unwrap();

    assert_eq!(assistant.generated_sql(), Some("SELECT COUNT(*) FROM signups"));
    assert_eq!(assistant.refined_sql(), Some("SELECT COUNT(*) FROM signup"));

    assistant.execute(QuerySlot::Generated).await.unwrap();
    assistant.execute(QuerySlot::Refined).await.unwrap();

    assert_eq!(
        executor.executed(),
        vec!["SELECT COUNT(*) FROM signups", "SELECT COUNT(*) FROM signup"]
    );
}

#[tokio::test]
async fn executing_an_empty_slot_is_a_session_error() {
    let client = Arc::new(MockLlmClient::new());
    let (mut assistant, _) = harness(client, Arc::new(MockExecutor::new()));

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();

    // No refinement has happened yet.
    let err = assistant.execute(QuerySlot::Refined).await.unwrap_err();
    assert_eq!(err.category(), "Session Error");
}

#[tokio::test]
async fn accepted_question_cannot_be_executed_again() {
    let client = Arc::new(MockLlmClient::new());
    let (mut assistant, _) = harness(client, Arc::new(MockExecutor::new()));

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();
    assistant.execute_current().await.unwrap();
    let outcome = assistant.record_feedback(true).await.unwrap();

    assert!(matches!(outcome, FeedbackOutcome::Accepted { .. }));
    assert_eq!(assistant.phase(), Phase::Accepted);
    assert!(assistant.execute_current().await.is_err());
}

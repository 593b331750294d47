//! Feedback recording and the refinement loop it drives.

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use sql_scout::app::{Assistant, FeedbackOutcome};
use sql_scout::db::{FailingExecutor, MockExecutor};
use sql_scout::error::{Result, ScoutError};
use sql_scout::feedback::{FailingFeedbackStore, MemoryFeedbackStore};
use sql_scout::llm::{LlmClient, Message, MockLlmClient};
use sql_scout::schema::SchemaContext;
use sql_scout::session::Phase;

/// Completes generation requests but fails every revision request.
struct RefineFailsClient {
    inner: MockLlmClient,
}

#[async_trait]
impl LlmClient for RefineFailsClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let is_revision = messages
            .iter()
            .any(|m| m.content.contains("not satisfied"));
        if is_revision {
            return Err(ScoutError::generation("revision quota exhausted"));
        }
        self.inner.complete(messages).await
    }
}

fn accept_harness() -> (Assistant, Arc<MockLlmClient>, MemoryFeedbackStore) {
    let client = Arc::new(MockLlmClient::new());
    let store = MemoryFeedbackStore::new();
    let assistant = Assistant::new(
        client.clone(),
        SchemaContext::builtin(),
        Arc::new(MockExecutor::new()),
        Arc::new(store.clone()),
    );
    (assistant, client, store)
}

#[tokio::test]
async fn accept_writes_one_record_and_never_refines() {
    let (mut assistant, client, store) = accept_harness();

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();
    assistant.execute_current().await.unwrap();

    let calls_before_feedback = client.call_count();
    let outcome = assistant.record_feedback(true).await.unwrap();

    let FeedbackOutcome::Accepted { feedback_id } = outcome else {
        panic!("expected Accepted outcome");
    };
    assert_eq!(feedback_id, 1);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].accepted);
    assert_eq!(records[0].question, "How many signups last week?");
    assert_eq!(records[0].sql, "SELECT COUNT(*) FROM signup");

    // Zero refinement calls on accept.
    assert_eq!(client.call_count(), calls_before_feedback);
    assert_eq!(assistant.phase(), Phase::Accepted);
}

#[tokio::test]
async fn reject_writes_one_record_and_refines_exactly_once() {
    let (mut assistant, client, store) = accept_harness();

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();

    let calls_before_feedback = client.call_count();
    let outcome = assistant.record_feedback(false).await.unwrap();

    let FeedbackOutcome::Rejected {
        feedback_id,
        refinement,
    } = outcome
    else {
        panic!("expected Rejected outcome");
    };
    assert_eq!(feedback_id, 1);
    assert!(refinement.is_ok());

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].accepted);

    // Exactly one refinement call on reject.
    assert_eq!(client.call_count(), calls_before_feedback + 1);
    assert_eq!(assistant.phase(), Phase::Refined);
}

#[tokio::test]
async fn refinement_prompt_carries_the_retained_execution_error() {
    let client = Arc::new(MockLlmClient::new());
    let store = MemoryFeedbackStore::new();
    let mut assistant = Assistant::new(
        client.clone(),
        SchemaContext::builtin(),
        Arc::new(FailingExecutor::syntax(
            "Unknown column 'emal' in 'field list'",
        )),
        Arc::new(store.clone()),
    );

    assistant
        .submit_question("Which emails signed up twice?")
        .await
        .unwrap();
    assistant.execute_current().await.unwrap_err();
    assistant.record_feedback(false).await.unwrap();

    let requests = client.requests();
    let revision_request = requests.last().unwrap();
    let system = &revision_request[0].content;

    assert!(system.contains("Which emails signed up twice?"));
    assert!(system.contains("Unknown column 'emal' in 'field list'"));
}

#[tokio::test]
async fn refined_query_can_receive_its_own_feedback() {
    let (mut assistant, _, store) = accept_harness();

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();
    assistant.record_feedback(false).await.unwrap();

    // The refined query is a fresh candidate; judging it is legal.
    let outcome = assistant.record_feedback(true).await.unwrap();
    assert!(matches!(outcome, FeedbackOutcome::Accepted { .. }));

    let records = store.records();
    assert_eq!(records.len(), 2);
    assert!(!records[0].accepted);
    assert!(records[1].accepted);
    // The second record judges the refined SQL.
    assert_eq!(records[1].sql, assistant.refined_sql().unwrap());
}

#[tokio::test]
async fn double_feedback_on_one_candidate_is_rejected() {
    let (mut assistant, _, store) = accept_harness();

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();
    assistant.record_feedback(true).await.unwrap();

    let err = assistant.record_feedback(true).await.unwrap_err();
    assert_eq!(err.category(), "Session Error");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn persistence_failure_surfaces_and_leaves_the_session_intact() {
    let client = Arc::new(MockLlmClient::new());
    let mut assistant = Assistant::new(
        client.clone(),
        SchemaContext::builtin(),
        Arc::new(MockExecutor::new()),
        Arc::new(FailingFeedbackStore),
    );

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();

    let calls_before_feedback = client.call_count();
    let err = assistant.record_feedback(false).await.unwrap_err();

    assert_eq!(err.category(), "Persistence Error");
    // No refinement when the write failed, and the candidate is untouched.
    assert_eq!(client.call_count(), calls_before_feedback);
    assert_eq!(assistant.phase(), Phase::Generated);
    assert!(!assistant.feedback_given());
    assert!(assistant.current_sql().is_some());
}

#[tokio::test]
async fn refinement_failure_keeps_the_feedback_and_the_prior_query() {
    let client = Arc::new(RefineFailsClient {
        inner: MockLlmClient::new(),
    });
    let store = MemoryFeedbackStore::new();
    let mut assistant = Assistant::new(
        client,
        SchemaContext::builtin(),
        Arc::new(MockExecutor::new()),
        Arc::new(store.clone()),
    );

    assistant
        .submit_question("How many signups last week?")
        .await
        .unwrap();
    let outcome = assistant.record_feedback(false).await.unwrap();

    let FeedbackOutcome::Rejected { refinement, .. } = outcome else {
        panic!("expected Rejected outcome");
    };
    let refine_err = refinement.unwrap_err();
    assert!(refine_err.to_string().contains("revision quota exhausted"));

    // The feedback record stands.
    assert_eq!(store.len(), 1);
    // The prior query survives and is still runnable.
    assert_eq!(assistant.phase(), Phase::RefinementFailed);
    assert_eq!(assistant.current_sql(), Some("SELECT COUNT(*) FROM signup"));
    assistant.execute_current().await.unwrap();
}

//! Orchestration of the generate/execute/feedback/refine loop.
//!
//! [`Assistant`] owns the session state and the three adapters (completion
//! client, executor, feedback store), drives all side effects, and recovers
//! every typed error into something the caller can surface. None of these
//! errors are fatal; a new question always resets the session.

use std::sync::Arc;

use tracing::{debug, info};

use crate::db::{QueryResult, SqlExecutor};
use crate::error::{Result, ScoutError};
use crate::feedback::FeedbackStore;
use crate::llm::{LlmClient, QueryGenerator, QueryRefiner};
use crate::schema::SchemaContext;
use crate::session::{ExecutionFailure, Phase, QuerySlot, SessionState};

/// What happened to a feedback submission.
#[derive(Debug)]
pub enum FeedbackOutcome {
    /// Positive feedback persisted; the question is settled.
    Accepted {
        /// Identifier of the persisted record.
        feedback_id: i64,
    },
    /// Negative feedback persisted and one refinement attempted.
    Rejected {
        /// Identifier of the persisted record.
        feedback_id: i64,
        /// The refined SQL, or the error that prevented refinement. Either
        /// way the feedback record stands and the prior query survives.
        refinement: Result<String>,
    },
}

/// One user's SQL assistant session.
pub struct Assistant {
    generator: QueryGenerator,
    refiner: QueryRefiner,
    executor: Arc<dyn SqlExecutor>,
    feedback: Arc<dyn FeedbackStore>,
    state: SessionState,
}

impl Assistant {
    /// Creates an assistant over the given adapters.
    ///
    /// The completion client is shared by the generator and refiner; it is
    /// long-lived and stateless per invocation.
    pub fn new(
        client: Arc<dyn LlmClient>,
        schema: SchemaContext,
        executor: Arc<dyn SqlExecutor>,
        feedback: Arc<dyn FeedbackStore>,
    ) -> Self {
        Self {
            generator: QueryGenerator::new(client.clone(), schema.clone()),
            refiner: QueryRefiner::new(client, schema),
            executor,
            feedback,
            state: SessionState::new(),
        }
    }

    /// Submits a new question, discarding all state from the previous one,
    /// and generates a candidate query for it.
    pub async fn submit_question(&mut self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ScoutError::session("Question must not be empty"));
        }

        self.state.reset(question);
        info!("New question: {question}");

        match self.generator.generate(question).await {
            Ok(sql) => {
                self.state.note_generated(sql.clone())?;
                Ok(sql)
            }
            Err(e) => {
                self.state.note_generation_failed()?;
                Err(e)
            }
        }
    }

    /// Executes the query in the given slot against the store.
    ///
    /// Never triggered automatically. A failure is retained in the session
    /// so the next refinement prompt can reference it, and does not block
    /// feedback collection.
    pub async fn execute(&mut self, slot: QuerySlot) -> Result<QueryResult> {
        self.state.ensure_can_execute()?;
        let sql = self
            .state
            .sql_for(slot)
            .ok_or_else(|| ScoutError::session("No query in that slot to execute"))?
            .to_string();

        debug!("Executing: {sql}");
        match self.executor.execute(&sql).await {
            Ok(result) => {
                self.state.note_execution_succeeded()?;
                Ok(result)
            }
            Err(e) => {
                if let ScoutError::Execution { kind, message } = &e {
                    self.state
                        .note_execution_failed(ExecutionFailure::new(*kind, message.clone()))?;
                }
                Err(e)
            }
        }
    }

    /// Executes the current candidate: the refined query when one exists,
    /// otherwise the generated one.
    pub async fn execute_current(&mut self) -> Result<QueryResult> {
        let slot = if self.state.refined_sql().is_some() {
            QuerySlot::Refined
        } else {
            QuerySlot::Generated
        };
        self.execute(slot).await
    }

    /// Records the user's judgment on the current candidate.
    ///
    /// Exactly one feedback record is written per call; a rejection then
    /// triggers exactly one refinement attempt, grounded in the retained
    /// execution error when one exists. A refinement failure is reported in
    /// the outcome without discarding the still-valid prior query.
    pub async fn record_feedback(&mut self, accepted: bool) -> Result<FeedbackOutcome> {
        self.state.ensure_can_record_feedback()?;

        let question = self
            .state
            .question()
            .expect("a candidate implies a question")
            .to_string();
        let sql = self
            .state
            .current_sql()
            .expect("checked by ensure_can_record_feedback")
            .to_string();

        // Persist before transitioning; a failed write leaves the session
        // untouched so the user can retry.
        let feedback_id = self.feedback.record(&question, &sql, accepted).await?;

        if accepted {
            self.state.note_feedback_accepted()?;
            info!("Feedback accepted (record {feedback_id})");
            return Ok(FeedbackOutcome::Accepted { feedback_id });
        }

        self.state.note_feedback_rejected()?;
        info!("Feedback rejected (record {feedback_id}), refining");

        let last_error = self.state.last_error().map(|e| e.message.clone());
        let refinement = self
            .refiner
            .refine(&question, &sql, last_error.as_deref())
            .await;

        match refinement {
            Ok(refined) => {
                self.state.note_refined(refined.clone())?;
                Ok(FeedbackOutcome::Rejected {
                    feedback_id,
                    refinement: Ok(refined),
                })
            }
            Err(e) => {
                self.state.note_refinement_failed()?;
                Ok(FeedbackOutcome::Rejected {
                    feedback_id,
                    refinement: Err(e),
                })
            }
        }
    }

    /// Lists tables visible to the configured user; a connection smoke test.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.executor.list_tables().await
    }

    // Read accessors for the UI.

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn question(&self) -> Option<&str> {
        self.state.question()
    }

    pub fn generated_sql(&self) -> Option<&str> {
        self.state.generated_sql()
    }

    pub fn refined_sql(&self) -> Option<&str> {
        self.state.refined_sql()
    }

    pub fn current_sql(&self) -> Option<&str> {
        self.state.current_sql()
    }

    pub fn last_error(&self) -> Option<&ExecutionFailure> {
        self.state.last_error()
    }

    pub fn feedback_given(&self) -> bool {
        self.state.feedback_given()
    }
}

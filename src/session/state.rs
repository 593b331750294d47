//! The mutable session aggregate.

use std::str::FromStr;

use crate::error::{ExecutionErrorKind, Result, ScoutError};
use crate::session::phase::{transition, Event, Phase};

/// A retained execution failure.
///
/// Kept after a failed run so the next refinement prompt can steer the
/// model away from the same mistake. Cleared only when a new question
/// starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFailure {
    /// Failure classification.
    pub kind: ExecutionErrorKind,
    /// The server or driver message, verbatim.
    pub message: String,
}

impl ExecutionFailure {
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Which candidate query to address.
///
/// The original and refined query stay independently executable until a
/// new question arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySlot {
    /// The query produced for the question as first asked.
    Generated,
    /// The latest revision produced after negative feedback.
    Refined,
}

impl FromStr for QuerySlot {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generated" | "original" => Ok(Self::Generated),
            "refined" | "improved" => Ok(Self::Refined),
            _ => Err(format!(
                "Unknown query slot: {s}. Expected 'original' or 'refined'"
            )),
        }
    }
}

/// Process-local state for one user session.
///
/// The single mutable aggregate of the system. Mutated only by the
/// orchestration layer; reset wholesale when a new question is submitted.
/// Not designed to be shared between users; partition per session instead.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    phase: Phase,
    question: Option<String>,
    generated_sql: Option<String>,
    refined_sql: Option<String>,
    last_error: Option<ExecutionFailure>,
    feedback_given: bool,
}

impl SessionState {
    /// Creates an empty session in the idle phase.
    pub fn new() -> Self {
        Self::default()
    }

    // Accessors.

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn generated_sql(&self) -> Option<&str> {
        self.generated_sql.as_deref()
    }

    pub fn refined_sql(&self) -> Option<&str> {
        self.refined_sql.as_deref()
    }

    /// The query feedback and execution default to: the refined query when
    /// one exists, otherwise the generated one.
    pub fn current_sql(&self) -> Option<&str> {
        self.refined_sql.as_deref().or(self.generated_sql.as_deref())
    }

    pub fn sql_for(&self, slot: QuerySlot) -> Option<&str> {
        match slot {
            QuerySlot::Generated => self.generated_sql.as_deref(),
            QuerySlot::Refined => self.refined_sql.as_deref(),
        }
    }

    pub fn last_error(&self) -> Option<&ExecutionFailure> {
        self.last_error.as_ref()
    }

    pub fn feedback_given(&self) -> bool {
        self.feedback_given
    }

    // Transitions. Each applies the pure table first so an illegal event
    // leaves the aggregate untouched.

    /// Starts a new question, discarding all derived state.
    ///
    /// `QuestionSubmitted` is legal in every phase and always lands in
    /// `Idle`, so this cannot fail.
    pub fn reset(&mut self, question: impl Into<String>) {
        self.phase = Phase::Idle;
        self.question = Some(question.into());
        self.generated_sql = None;
        self.refined_sql = None;
        self.last_error = None;
        self.feedback_given = false;
    }

    /// Records a successful generation; the SQL becomes the candidate.
    pub fn note_generated(&mut self, sql: impl Into<String>) -> Result<()> {
        self.phase = transition(self.phase, Event::QueryGenerated)?;
        self.generated_sql = Some(sql.into());
        Ok(())
    }

    /// Records a failed generation; terminal for this question.
    pub fn note_generation_failed(&mut self) -> Result<()> {
        self.phase = transition(self.phase, Event::GenerationFailed)?;
        Ok(())
    }

    /// Confirms that an execution may start in the current phase.
    pub fn ensure_can_execute(&self) -> Result<()> {
        transition(self.phase, Event::ExecutionSucceeded).map(|_| ())
    }

    /// Records a successful execution.
    pub fn note_execution_succeeded(&mut self) -> Result<()> {
        self.phase = transition(self.phase, Event::ExecutionSucceeded)?;
        Ok(())
    }

    /// Records a failed execution, retaining the failure for refinement.
    pub fn note_execution_failed(&mut self, failure: ExecutionFailure) -> Result<()> {
        self.phase = transition(self.phase, Event::ExecutionFailed)?;
        self.last_error = Some(failure);
        Ok(())
    }

    /// Confirms that feedback may be recorded for the current candidate.
    pub fn ensure_can_record_feedback(&self) -> Result<()> {
        if self.current_sql().is_none() {
            return Err(ScoutError::session("No query to give feedback on"));
        }
        if self.feedback_given {
            return Err(ScoutError::session(
                "Feedback has already been recorded for this query",
            ));
        }
        transition(self.phase, Event::FeedbackAccepted).map(|_| ())
    }

    /// Records positive feedback; terminal for this question.
    pub fn note_feedback_accepted(&mut self) -> Result<()> {
        self.ensure_can_record_feedback()?;
        self.phase = transition(self.phase, Event::FeedbackAccepted)?;
        self.feedback_given = true;
        Ok(())
    }

    /// Records negative feedback and enters the refining phase.
    pub fn note_feedback_rejected(&mut self) -> Result<()> {
        self.ensure_can_record_feedback()?;
        self.phase = transition(self.phase, Event::FeedbackRejected)?;
        self.feedback_given = true;
        Ok(())
    }

    /// Installs a refined query as the current candidate.
    ///
    /// Feedback rearms for the new candidate; the previous refined query,
    /// if any, is discarded.
    pub fn note_refined(&mut self, sql: impl Into<String>) -> Result<()> {
        self.phase = transition(self.phase, Event::QueryRefined)?;
        self.refined_sql = Some(sql.into());
        self.feedback_given = false;
        Ok(())
    }

    /// Records a failed refinement; the prior query remains inspectable.
    pub fn note_refinement_failed(&mut self) -> Result<()> {
        self.phase = transition(self.phase, Event::RefinementFailed)?;
        Ok(())
    }
}

//! Phase and event enumeration with the pure transition table.

use crate::error::{Result, ScoutError};

/// Where the current question is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No question, or a question submitted but not yet generated for.
    #[default]
    Idle,
    /// A candidate query exists and has not been executed.
    Generated,
    /// Generation failed; terminal for this question, nothing to execute.
    GenerationFailed,
    /// The last execution returned a result set.
    Executed,
    /// The last execution failed; the error is retained for refinement.
    ExecutionFailed,
    /// Positive feedback recorded; terminal for this question.
    Accepted,
    /// Negative feedback recorded; a revision request is in flight.
    Refining,
    /// A refined query is the current candidate.
    Refined,
    /// Refinement failed; the prior query remains inspectable.
    RefinementFailed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generated => "generated",
            Self::GenerationFailed => "generation failed",
            Self::Executed => "executed",
            Self::ExecutionFailed => "execution failed",
            Self::Accepted => "accepted",
            Self::Refining => "refining",
            Self::Refined => "refined",
            Self::RefinementFailed => "refinement failed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened, as reported by the orchestration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    QuestionSubmitted,
    QueryGenerated,
    GenerationFailed,
    ExecutionSucceeded,
    ExecutionFailed,
    FeedbackAccepted,
    FeedbackRejected,
    QueryRefined,
    RefinementFailed,
}

/// Pure transition table for the session state machine.
///
/// Illegal (phase, event) pairs return a session error and imply no state
/// change. A new question is legal in every phase and restarts the cycle.
pub fn transition(phase: Phase, event: Event) -> Result<Phase> {
    use Event as E;
    use Phase as P;

    let next = match (phase, event) {
        (_, E::QuestionSubmitted) => P::Idle,

        (P::Idle, E::QueryGenerated) => P::Generated,
        (P::Idle, E::GenerationFailed) => P::GenerationFailed,

        // Execution is user-triggered and repeatable while a candidate
        // exists and feedback has not terminated the question.
        (
            P::Generated | P::Executed | P::ExecutionFailed | P::Refined | P::RefinementFailed,
            E::ExecutionSucceeded,
        ) => P::Executed,
        (
            P::Generated | P::Executed | P::ExecutionFailed | P::Refined | P::RefinementFailed,
            E::ExecutionFailed,
        ) => P::ExecutionFailed,

        // Feedback does not require a prior execution.
        (P::Generated | P::Executed | P::ExecutionFailed | P::Refined, E::FeedbackAccepted) => {
            P::Accepted
        }
        (P::Generated | P::Executed | P::ExecutionFailed | P::Refined, E::FeedbackRejected) => {
            P::Refining
        }

        (P::Refining, E::QueryRefined) => P::Refined,
        (P::Refining, E::RefinementFailed) => P::RefinementFailed,

        (phase, event) => {
            return Err(ScoutError::session(format!(
                "{event:?} is not legal in phase '{phase}'"
            )))
        }
    };

    Ok(next)
}

//! Feedback persistence.
//!
//! Append-only sink for user judgments on generated queries. Records are
//! never updated or deleted; duplicate submissions produce duplicate rows.
//! Besides driving refinement, the table is a place operators can later
//! mine accepted and rejected queries.

mod memory;
mod mysql;

pub use memory::{FailingFeedbackStore, MemoryFeedbackStore};
pub use mysql::MySqlFeedbackStore;

use crate::error::Result;
use async_trait::async_trait;

/// A persisted user judgment on a generated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    /// Generated identifier.
    pub id: i64,
    /// The question the query was generated for.
    pub question: String,
    /// The SQL text the judgment applies to.
    pub sql: String,
    /// True for accepted, false for rejected.
    pub accepted: bool,
}

/// Trait for feedback sinks.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Persists one (question, sql, accepted) record and returns its
    /// generated identifier.
    ///
    /// Implementations must confirm the identifier exists after the write
    /// before reporting success, to catch silent no-op writes.
    async fn record(&self, question: &str, sql: &str, accepted: bool) -> Result<i64>;
}

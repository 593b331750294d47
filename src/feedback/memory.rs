//! In-memory feedback stores for testing.

use crate::error::{Result, ScoutError};
use crate::feedback::{FeedbackRecord, FeedbackStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Feedback store keeping records in memory, for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeedbackStore {
    records: Arc<Mutex<Vec<FeedbackRecord>>>,
}

impl MemoryFeedbackStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record saved so far.
    pub fn records(&self) -> Vec<FeedbackRecord> {
        self.records.lock().expect("store lock poisoned").clone()
    }

    /// Returns the number of records saved.
    pub fn len(&self) -> usize {
        self.records.lock().expect("store lock poisoned").len()
    }

    /// Returns true if no records have been saved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn record(&self, question: &str, sql: &str, accepted: bool) -> Result<i64> {
        let mut records = self.records.lock().expect("store lock poisoned");
        let id = records.len() as i64 + 1;
        records.push(FeedbackRecord {
            id,
            question: question.to_string(),
            sql: sql.to_string(),
            accepted,
        });
        Ok(id)
    }
}

/// Feedback store that fails every write, for persistence-error tests.
#[derive(Debug, Clone, Default)]
pub struct FailingFeedbackStore;

#[async_trait]
impl FeedbackStore for FailingFeedbackStore {
    async fn record(&self, _question: &str, _sql: &str, _accepted: bool) -> Result<i64> {
        Err(ScoutError::persistence("feedback table unavailable"))
    }
}

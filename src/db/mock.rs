//! Mock executors for testing.

use super::{ColumnInfo, QueryResult, SqlExecutor, Value};
use crate::error::{ExecutionErrorKind, Result, ScoutError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock executor that returns a canned single-row result and records
/// every statement it is asked to run.
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    tables: Vec<String>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MockExecutor {
    /// Creates a new mock executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tables reported by `list_tables`.
    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }

    /// Returns every statement executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.executed
            .lock()
            .expect("mock lock poisoned")
            .push(sql.to_string());

        let columns = vec![ColumnInfo::new("result", "VARCHAR")];
        let rows = vec![vec![Value::String(format!("Mock result for: {}", sql))]];

        Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.clone())
    }
}

/// A mock executor that fails every statement with a configured error.
#[derive(Debug, Clone)]
pub struct FailingExecutor {
    kind: ExecutionErrorKind,
    message: String,
}

impl FailingExecutor {
    /// Creates a failing executor with the given classification and message.
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Convenience constructor for a syntax failure.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::Syntax, message)
    }
}

#[async_trait]
impl SqlExecutor for FailingExecutor {
    async fn execute(&self, _sql: &str) -> Result<QueryResult> {
        Err(ScoutError::execution(self.kind, self.message.clone()))
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Err(ScoutError::execution(self.kind, self.message.clone()))
    }
}

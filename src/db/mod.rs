//! Database abstraction layer.
//!
//! Provides a trait-based interface over the relational store so the
//! orchestration layer can be exercised against mock executors in tests.

mod mock;
mod mysql;
mod types;

pub use mock::{FailingExecutor, MockExecutor};
pub use mysql::MySqlExecutor;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for SQL execution.
///
/// Generated SQL is executed verbatim; this is an explicit trust boundary
/// (completion output is treated as trusted input). Implementations open a
/// fresh connection per call and release it on every exit path.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes a SQL statement and returns the result set.
    async fn execute(&self, sql: &str) -> Result<QueryResult>;

    /// Lists the tables visible to the configured database user.
    ///
    /// Backs the connection smoke test; not part of the generation loop.
    async fn list_tables(&self) -> Result<Vec<String>>;
}

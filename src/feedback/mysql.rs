//! MySQL feedback store.
//!
//! Single-row inserts into the `query_feedback` table with a
//! read-after-write check on the generated identifier.

use crate::config::DbConfig;
use crate::error::{Result, ScoutError};
use crate::feedback::FeedbackStore;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Row};
use tracing::{debug, warn};

/// Feedback store backed by the analytics MySQL database.
#[derive(Debug, Clone)]
pub struct MySqlFeedbackStore {
    options: MySqlConnectOptions,
}

impl MySqlFeedbackStore {
    /// Creates a store from a database configuration.
    pub fn new(config: &DbConfig) -> Result<Self> {
        Ok(Self {
            options: config.to_connect_options()?,
        })
    }

    /// Opens a fresh connection for one call.
    async fn connect(&self) -> Result<MySqlConnection> {
        self.options
            .connect()
            .await
            .map_err(|e| ScoutError::persistence(format!("Failed to connect: {e}")))
    }

    /// Creates the `query_feedback` table if it does not exist.
    pub async fn ensure_table(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let outcome = sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS query_feedback (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                question TEXT NOT NULL,
                sql_query TEXT NOT NULL,
                feedback TINYINT(1) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut conn)
        .await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close connection cleanly: {e}");
        }

        outcome
            .map(|_| ())
            .map_err(|e| ScoutError::persistence(format!("Failed to create feedback table: {e}")))
    }

    /// Inserts one record and verifies the generated id exists.
    async fn record_on(
        conn: &mut MySqlConnection,
        question: &str,
        sql: &str,
        accepted: bool,
    ) -> Result<i64> {
        let insert = sqlx::query(
            "INSERT INTO query_feedback (question, sql_query, feedback) VALUES (?, ?, ?)",
        )
        .bind(question)
        .bind(sql)
        .bind(accepted)
        .execute(&mut *conn)
        .await
        .map_err(|e| ScoutError::persistence(format!("Failed to record feedback: {e}")))?;

        let id = insert.last_insert_id() as i64;
        if id <= 0 {
            return Err(ScoutError::persistence(
                "Feedback insert produced no identifier",
            ));
        }

        // Read-after-write check to catch silent no-op writes.
        let verified = sqlx::query("SELECT id FROM query_feedback WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| ScoutError::persistence(format!("Failed to verify feedback: {e}")))?;

        match verified {
            Some(row) => {
                let confirmed: i64 = row
                    .try_get(0)
                    .map_err(|e| ScoutError::persistence(format!("Failed to verify feedback: {e}")))?;
                debug!("Recorded feedback id {confirmed} (accepted={accepted})");
                Ok(confirmed)
            }
            None => Err(ScoutError::persistence(format!(
                "Feedback insert could not be verified (id {id} not found)"
            ))),
        }
    }
}

#[async_trait]
impl FeedbackStore for MySqlFeedbackStore {
    async fn record(&self, question: &str, sql: &str, accepted: bool) -> Result<i64> {
        let mut conn = self.connect().await?;
        let outcome = Self::record_on(&mut conn, question, sql, accepted).await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close connection cleanly: {e}");
        }

        outcome
    }
}

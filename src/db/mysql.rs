//! MySQL executor implementation.
//!
//! Opens a fresh connection per call (no pooling, no transaction semantics
//! beyond the single statement) and guarantees release on all exit paths.

use crate::config::DbConfig;
use crate::db::{ColumnInfo, QueryResult, Row, SqlExecutor, Value};
use crate::error::{ExecutionErrorKind, Result, ScoutError};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column as SqlxColumn, ConnectOptions, Connection, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows to return from a query.
const MAX_ROWS: usize = 1000;

/// MySQL executor with per-call connections.
#[derive(Debug, Clone)]
pub struct MySqlExecutor {
    options: MySqlConnectOptions,
    display_target: String,
}

impl MySqlExecutor {
    /// Creates an executor from a database configuration.
    pub fn new(config: &DbConfig) -> Result<Self> {
        let options = config.to_connect_options()?;
        Ok(Self {
            options,
            display_target: config.display_string(),
        })
    }

    /// Opens a fresh connection for one call.
    async fn connect(&self) -> Result<MySqlConnection> {
        debug!("Connecting to {}", self.display_target);
        self.options
            .connect()
            .await
            .map_err(|e| map_connection_error(e, &self.display_target))
    }

    /// Runs a statement on a scoped connection, closing it on every path.
    async fn run(&self, sql: &str) -> Result<Vec<MySqlRow>> {
        let mut conn = self.connect().await?;

        let fetched = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&mut conn),
        )
        .await;

        // Release the connection before inspecting the outcome.
        if let Err(e) = conn.close().await {
            warn!("Failed to close connection cleanly: {e}");
        }

        match fetched {
            Err(_) => Err(ScoutError::execution(
                ExecutionErrorKind::Timeout,
                format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds"),
            )),
            Ok(Err(e)) => Err(map_query_error(e)),
            Ok(Ok(rows)) => Ok(rows),
        }
    }
}

#[async_trait]
impl SqlExecutor for MySqlExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let result = self.run(sql).await?;
        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|first_row| {
                first_row
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let total_rows = result.len();
        let was_truncated = total_rows > MAX_ROWS;
        if was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                total_rows, MAX_ROWS
            );
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            was_truncated,
        })
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = self.run("SHOW TABLES").await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<String, _>(0).ok())
            .collect())
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Decode failures degrade to NULL rather than failing the whole result.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DATETIME" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "DECIMAL" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .or_else(|| {
                row.try_get::<Option<String>, _>(index)
                    .ok()
                    .flatten()
                    .map(Value::String)
            })
            .unwrap_or(Value::Null),

        "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // Text-ish types and everything else: try string, then raw bytes.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .or_else(|| {
                row.try_get::<Option<Vec<u8>>, _>(index)
                    .ok()
                    .flatten()
                    .map(Value::Bytes)
            })
            .unwrap_or(Value::Null),
    }
}

/// Maps connection-phase failures to friendly, classified errors.
fn map_connection_error(error: sqlx::Error, target: &str) -> ScoutError {
    let error_str = error.to_string().to_lowercase();

    let message = if error_str.contains("connection refused") || error_str.contains("could not connect")
    {
        format!("Cannot connect to {target}. Check that the server is running.")
    } else if error_str.contains("access denied") {
        format!("Access denied connecting to {target}. Check your credentials.")
    } else if error_str.contains("unknown database") {
        format!("Database does not exist ({target}).")
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        format!("Connection to {target} timed out. The server may be overloaded or unreachable.")
    } else {
        error.to_string()
    };

    ScoutError::execution(ExecutionErrorKind::Connection, message)
}

/// Maps statement-phase failures to classified errors with the server
/// message preserved.
fn map_query_error(error: sqlx::Error) -> ScoutError {
    if let Some(db_error) = error.as_database_error() {
        let kind = db_error
            .code()
            .map(|code| kind_from_mysql_code(code.as_ref()))
            .unwrap_or(ExecutionErrorKind::Other);
        return ScoutError::execution(kind, db_error.message());
    }

    let kind = match &error {
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
            ExecutionErrorKind::Connection
        }
        _ => ExecutionErrorKind::Other,
    };
    ScoutError::execution(kind, error.to_string())
}

/// Classifies a MySQL server error number.
fn kind_from_mysql_code(code: &str) -> ExecutionErrorKind {
    match code {
        // Parse errors, unknown tables/columns, malformed expressions.
        "1064" | "1054" | "1052" | "1055" | "1146" | "1241" | "1242" | "1305" => {
            ExecutionErrorKind::Syntax
        }
        // Access denied at the database, table, or column level.
        "1044" | "1045" | "1142" | "1143" | "1227" | "1370" => ExecutionErrorKind::Permission,
        // Lock wait and statement execution timeouts.
        "1205" | "3024" => ExecutionErrorKind::Timeout,
        _ => ExecutionErrorKind::Other,
    }
}

//! Error types for sql-scout.
//!
//! Defines the closed error taxonomy used throughout the application.

use thiserror::Error;

/// Classification of a database-layer failure.
///
/// Retained alongside the message so refinement prompts and callers can
/// react to the failure class without inspecting message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// Server unreachable, auth failed, connection dropped.
    Connection,
    /// The SQL itself was rejected (syntax, unknown table/column).
    Syntax,
    /// The database user lacks privileges for the statement.
    Permission,
    /// The statement exceeded the query timeout.
    Timeout,
    /// Anything the classifier could not place.
    Other,
}

impl ExecutionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Syntax => "syntax",
            Self::Permission => "permission",
            Self::Timeout => "timeout",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for sql-scout operations.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Completion service failures (unreachable, rejected, malformed response).
    #[error("Generation error: {0}")]
    Generation(String),

    /// Database-layer failures (connection, syntax, permission, timeout).
    #[error("Execution error ({kind}): {message}")]
    Execution {
        kind: ExecutionErrorKind,
        message: String,
    },

    /// Feedback write failed or could not be verified.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors (invalid config file, missing required values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Illegal session state transitions.
    #[error("Session error: {0}")]
    Session(String),
}

impl ScoutError {
    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates an execution error with the given classification and message.
    pub fn execution(kind: ExecutionErrorKind, msg: impl Into<String>) -> Self {
        Self::Execution {
            kind,
            message: msg.into(),
        }
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a session error with the given message.
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Generation(_) => "Generation Error",
            Self::Execution { .. } => "Execution Error",
            Self::Persistence(_) => "Persistence Error",
            Self::Config(_) => "Configuration Error",
            Self::Session(_) => "Session Error",
        }
    }
}

/// Result type alias using ScoutError.
pub type Result<T> = std::result::Result<T, ScoutError>;

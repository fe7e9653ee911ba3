//! Error types for the change-log engine
//!
//! A statement excluded by the logging policy is not an error: the gateway
//! reports it as a skipped write and `log` returns normally.

use thiserror::Error;

/// Result type alias for change-log operations
pub type Result<T> = std::result::Result<T, ChangeLogError>;

#[derive(Error, Debug)]
pub enum ChangeLogError {
    /// The SQL text could not be parsed
    #[error("Failed to parse SQL statement: {message}. SQL: {sql}")]
    Parse { sql: String, message: String },

    /// The SQL text holds more than one statement
    #[error("Expected exactly one statement, found {count}. Log each statement separately.")]
    AmbiguousStatement { count: usize },

    /// No audit sink has been attached yet
    #[error("Audit store is not configured. Call `connect` or `with_sink` before logging changes.")]
    NotConfigured,

    /// Writing to the audit store failed
    #[error("Audit store error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// The audit store could not be used
    #[error("Audit store unavailable: {0}")]
    Store(String),

    /// A table or column name cannot be used as an identifier
    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    /// The logging policy document is malformed
    #[error("Invalid logging policy: {0}")]
    InvalidPolicy(String),

    /// Settings are missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or settings file.")]
    Config(String),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Environment(#[from] changelog_common::CommonError),
}

impl ChangeLogError {
    /// Create a parse error
    pub fn parse(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid policy error
    pub fn invalid_policy(msg: impl Into<String>) -> Self {
        Self::InvalidPolicy(msg.into())
    }
}

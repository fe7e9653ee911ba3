//! Error types for the changelog CLI
//!
//! User-facing errors with clear, actionable messages.

use changelog_core::ChangeLogError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// The change log engine reported an error
    #[error(transparent)]
    ChangeLog(#[from] ChangeLogError),

    /// `--params` is not usable
    #[error("Invalid parameters: {0}. Pass a JSON object for named or a JSON array for positional placeholders.")]
    InvalidParams(String),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}. Check the syntax.")]
    JsonParse(#[from] serde_json::Error),

    /// A command-line argument has an unsupported value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    /// Create an invalid parameters error
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while reading environment-backed settings
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidEnvValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Environment variable {0} is not valid unicode")]
    NotUnicode(String),
}

impl CommonError {
    /// Create an invalid environment value error
    pub fn invalid_env_value(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEnvValue {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

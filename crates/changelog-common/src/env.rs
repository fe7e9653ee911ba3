//! Environment variable helpers
//!
//! Every reader loads `.env` once (via `dotenvy`) before looking at the
//! process environment, so local development and deployed services resolve
//! settings the same way.

use crate::error::{CommonError, Result};
use std::sync::Once;

static DOTENV: Once = Once::new();

/// Load `.env` from the working directory, at most once per process
pub fn load_dotenv() {
    DOTENV.call_once(|| {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
    });
}

/// Read a variable, treating empty values as unset
pub fn var(name: &str) -> Result<Option<String>> {
    load_dotenv();

    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(CommonError::NotUnicode(name.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_var_missing_is_none() {
        assert!(var("CHANGELOG_TEST_SURELY_UNSET_VAR").unwrap().is_none());
    }

    #[test]
    fn test_empty_value_is_unset() {
        std::env::set_var("CHANGELOG_TEST_EMPTY", "   ");
        assert!(var("CHANGELOG_TEST_EMPTY").unwrap().is_none());
        std::env::remove_var("CHANGELOG_TEST_EMPTY");
    }
}

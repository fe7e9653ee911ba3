//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod check;
pub mod init;
pub mod log;
pub mod show;

use crate::error::{CliError, Result};
use changelog_core::Action;

/// Parse an `insert|update|delete` argument
pub(crate) fn parse_action(raw: &str) -> Result<Action> {
    raw.parse::<Action>().map_err(CliError::invalid_argument)
}

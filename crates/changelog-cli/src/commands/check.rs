//! `changelog check` command implementation
//!
//! Evaluates the configured logging policy without touching the database.

use super::parse_action;
use crate::error::Result;
use changelog_core::Settings;
use colored::Colorize;

/// Print whether a change would be logged; returns the decision
pub fn run(settings: &Settings, table: &str, action: &str, column: Option<&str>) -> Result<bool> {
    let action = parse_action(action)?;
    let config = settings.changelog_config()?;
    let logged = config.policy.should_log(table, action, column);

    let target = match column {
        Some(column) => format!("{} {}.{}", action, table, column),
        None => format!("{} {}", action, table),
    };

    if logged {
        println!("{} {} is logged", "✓".green(), target.bold());
    } else {
        println!("{} {} is not logged", "✗".red(), target.bold());
    }

    Ok(logged)
}

//! Changelog CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line interface over the change log engine.
//!
//! # Overview
//!
//! - **Schema**: Create the audit table (`changelog init`)
//! - **Logging**: Record the changes of one statement (`changelog log`)
//! - **Inspection**: List stored records (`changelog show`)
//! - **Policy**: Evaluate the logging policy (`changelog check`)

pub mod commands;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, Result};

use changelog_core::Settings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// changelog - column-level audit trail for SQL statements
#[derive(Parser, Debug)]
#[command(name = "changelog")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// SQLite database holding the audit table [env: CHANGELOG_DATABASE]
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Logging policy file (YAML) [env: CHANGELOG_POLICY_FILE]
    #[arg(short, long, global = true)]
    pub policy: Option<PathBuf>,

    /// Label written to the `system` column [env: CHANGELOG_SYSTEM_NAME]
    #[arg(long, global = true)]
    pub system_name: Option<String>,
}

impl Cli {
    /// Environment settings with command-line overrides applied
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::from_env()?;

        if let Some(database) = self.database.as_ref() {
            settings.database = database.clone();
        }
        if let Some(policy) = self.policy.as_ref() {
            settings.policy_file = Some(policy.clone());
        }
        if let Some(system_name) = self.system_name.as_ref() {
            settings.system_name = system_name.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the audit table in the configured database
    Init,

    /// Record the changes made by one SQL statement
    Log {
        /// INSERT, UPDATE or DELETE statement
        sql: String,

        /// Bound parameters as JSON: an object for `:name`, an array for `?`
        #[arg(long)]
        params: Option<String>,

        /// Acting user id
        #[arg(short, long)]
        actor: Option<String>,

        /// Client IP address
        #[arg(long)]
        ip: Option<String>,

        /// Client user agent
        #[arg(long)]
        user_agent: Option<String>,
    },

    /// List stored audit records, newest first
    Show {
        /// Only records for this table
        #[arg(short, long)]
        table: Option<String>,

        /// Only records for this action (insert, update, delete)
        #[arg(short, long)]
        action: Option<String>,

        /// Only records by this user id
        #[arg(short, long)]
        user: Option<String>,

        /// Limit number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the policy logs a table, action and column
    Check {
        /// Table name
        table: String,

        /// Action (insert, update, delete)
        action: String,

        /// Column name, omitted for deletes
        column: Option<String>,
    },
}

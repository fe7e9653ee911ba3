//! `changelog log` command implementation

use crate::error::{CliError, Result};
use changelog_core::context::{DEFAULT_ACTOR_ID, UNKNOWN_IP};
use changelog_core::{AuditContext, ChangeLog, Params, Settings};
use colored::Colorize;

/// Arguments of one `log` invocation
#[derive(Debug, Clone, Default)]
pub struct LogArgs {
    pub sql: String,
    pub params: Option<String>,
    pub actor: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Parse the `--params` JSON document
pub fn parse_params(raw: &str) -> Result<Params> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    Params::from_json(&value)
        .ok_or_else(|| CliError::invalid_params(format!("expected an object or array, got '{}'", raw)))
}

pub fn run(settings: &Settings, args: &LogArgs) -> Result<()> {
    let params = args.params.as_deref().map(parse_params).transpose()?;

    let context = AuditContext::new(args.actor.as_deref().unwrap_or(DEFAULT_ACTOR_ID))
        .with_ip(args.ip.as_deref().unwrap_or(UNKNOWN_IP))
        .with_user_agent(args.user_agent.as_deref().unwrap_or_default());

    let mut changelog = ChangeLog::new(settings.changelog_config()?)?;
    changelog.connect(&settings.database)?;

    let summary = changelog.log(&args.sql, params.as_ref(), &context)?;

    if summary.attempted() == 0 {
        println!("{} No auditable changes, nothing logged", "→".cyan());
        return Ok(());
    }

    println!(
        "{} {} record(s) written, {} skipped by policy",
        "✓".green(),
        summary.written.to_string().bold(),
        summary.skipped
    );

    Ok(())
}

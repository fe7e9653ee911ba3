//! changelog CLI - Main entry point

use changelog_cli::commands::{self, log::LogArgs, show::ShowArgs};
use changelog_cli::{Cli, Commands};
use changelog_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Verbose mode logs debug to the console, otherwise warnings only
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("changelog-cli")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging, so a failed init is not fatal
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli) {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
fn execute_command(cli: &Cli) -> changelog_cli::Result<()> {
    let settings = cli.settings()?;

    match &cli.command {
        Commands::Init => commands::init::run(&settings),
        Commands::Log {
            sql,
            params,
            actor,
            ip,
            user_agent,
        } => commands::log::run(
            &settings,
            &LogArgs {
                sql: sql.clone(),
                params: params.clone(),
                actor: actor.clone(),
                ip: ip.clone(),
                user_agent: user_agent.clone(),
            },
        ),
        Commands::Show {
            table,
            action,
            user,
            limit,
            json,
        } => commands::show::run(
            &settings,
            &ShowArgs {
                table: table.clone(),
                action: action.clone(),
                user: user.clone(),
                limit: *limit,
                json: *json,
            },
        ),
        Commands::Check {
            table,
            action,
            column,
        } => commands::check::run(&settings, table, action, column.as_deref()).map(|_| ()),
    }
}

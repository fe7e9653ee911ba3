//! `changelog init` command implementation

use crate::error::Result;
use changelog_core::{Settings, SqliteAuditStore};
use colored::Colorize;

/// Create the audit table and its indexes
pub fn run(settings: &Settings) -> Result<()> {
    let store = SqliteAuditStore::open(&settings.database, &settings.audit_table)?;

    println!(
        "{} Audit table '{}' ready in {}",
        "✓".green(),
        store.audit_table().bold(),
        settings.database.display()
    );

    match settings.policy_file.as_ref() {
        Some(path) => println!("  {} {}", "Policy:".cyan(), path.display()),
        None => println!("  {} none, every table is logged", "Policy:".cyan()),
    }

    Ok(())
}

//! `changelog show` command implementation

use super::parse_action;
use crate::error::Result;
use changelog_core::store::StoredRecord;
use changelog_core::{AuditQuery, Settings, SqliteAuditStore};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

/// Filters and output options of one `show` invocation
#[derive(Debug, Clone, Default)]
pub struct ShowArgs {
    pub table: Option<String>,
    pub action: Option<String>,
    pub user: Option<String>,
    pub limit: usize,
    pub json: bool,
}

pub fn run(settings: &Settings, args: &ShowArgs) -> Result<()> {
    if !settings.database.exists() {
        println!(
            "{} No audit database at {}. Run 'changelog init' first.",
            "→".cyan(),
            settings.database.display()
        );
        return Ok(());
    }

    let query = AuditQuery {
        table: args.table.clone(),
        action: args.action.as_deref().map(parse_action).transpose()?,
        user_id: args.user.clone(),
        limit: args.limit,
    };

    let store = SqliteAuditStore::open(&settings.database, &settings.audit_table)?;
    let records = store.query(&query)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{} No audit records found", "→".cyan());
        return Ok(());
    }

    println!("{} Showing {} most recent records:", "→".cyan(), records.len());
    println!("{}", render(&records));

    Ok(())
}

fn render(records: &[StoredRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "#", "When", "Action", "Table", "Column", "Old", "New", "Where", "User", "IP",
        ]);

    for record in records {
        let reference = match (
            record.column_reference.as_deref(),
            record.operator_reference.as_deref(),
            record.value_reference.as_deref(),
        ) {
            (Some(column), Some(op), Some(value)) => format!("{} {} {}", column, op, value),
            _ => String::new(),
        };

        table.add_row(vec![
            record.id.to_string(),
            record.created_at.clone(),
            record.action.clone(),
            record.table.clone(),
            record.column.clone().unwrap_or_default(),
            display_value(record.old_value.as_deref()),
            display_value(record.new_value.as_deref()),
            reference,
            record.user_id.clone(),
            record.ip.clone(),
        ]);
    }

    table
}

fn display_value(value: Option<&str>) -> String {
    value.unwrap_or("NULL").to_string()
}

//! SQLite schema for the audit table

use crate::error::Result;
use crate::gateway::quote_qualified;
use rusqlite::Connection;

/// Create the audit table and its indexes if missing
pub fn init_schema(conn: &Connection, audit_table: &str) -> Result<()> {
    let table = quote_qualified(audit_table)?;
    let index_prefix = audit_table.replace(['.', '"'], "_");

    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            "id" INTEGER PRIMARY KEY AUTOINCREMENT,
            "created_at" DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,

            -- What changed
            "action" TEXT NOT NULL CHECK ("action" IN ('insert', 'update', 'delete')),
            "table" TEXT NOT NULL,
            "column" TEXT,
            "newValue" TEXT,
            "oldValue" TEXT,

            -- Which row(s)
            "columnReference" TEXT,
            "operatorReference" TEXT,
            "valueReference" TEXT,

            -- Who and from where
            "userId" TEXT NOT NULL,
            "ip" TEXT NOT NULL,
            "userAgent" TEXT NOT NULL DEFAULT '',
            "system" TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS "idx_{prefix}_table_action" ON {table} ("table", "action");
        CREATE INDEX IF NOT EXISTS "idx_{prefix}_created_at" ON {table} ("created_at");
        "#,
        table = table,
        prefix = index_prefix,
    ))?;

    Ok(())
}

//! Persistence gateway
//!
//! Turns an [`AuditRecord`] into one parameterized INSERT against the audit
//! table. Every value is bound; only identifiers (quoted) and a whitelisted
//! comparison operator are spliced into the SQL text.
//!
//! Updates capture the pre-change value with a correlated subquery that
//! reuses the statement's own WHERE comparison:
//!
//! ```sql
//! (SELECT "user"."name" FROM "user" WHERE "user"."id" = :valueReference LIMIT 1)
//! ```
//!
//! The lookup runs when the record is written, so the change log must see
//! the UPDATE before the database executes it. When the condition matches
//! several rows an arbitrary one of them is captured.

use crate::error::{ChangeLogError, Result};
use crate::record::{Action, AuditRecord, TableName};

/// Default audit table name
pub const DEFAULT_AUDIT_TABLE: &str = "data_change_log";

/// Audit table columns, in insertion order
pub const AUDIT_COLUMNS: [&str; 12] = [
    "action",
    "table",
    "column",
    "newValue",
    "columnReference",
    "operatorReference",
    "valueReference",
    "userId",
    "ip",
    "userAgent",
    "system",
    "oldValue",
];

/// A prepared audit write: SQL with named placeholders plus bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditWrite {
    pub sql: String,
    pub params: Vec<(&'static str, Option<String>)>,
}

impl AuditWrite {
    /// Bound value for a placeholder such as `:table`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| value.as_deref())
    }
}

/// Quote one identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> Result<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(ChangeLogError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a table name part by part
pub fn quote_table(table: &TableName) -> Result<String> {
    if table.parts().is_empty() {
        return Err(ChangeLogError::InvalidIdentifier(String::new()));
    }
    table
        .parts()
        .iter()
        .map(|part| quote_identifier(part))
        .collect::<Result<Vec<_>>>()
        .map(|parts| parts.join("."))
}

/// Quote a configured name, where a dot separates schema and table
pub fn quote_qualified(name: &str) -> Result<String> {
    quote_table(&TableName::new(name.split('.')))
}

/// Builds audit writes for a fixed audit table
#[derive(Debug, Clone)]
pub struct AuditGateway {
    audit_table: String,
}

impl AuditGateway {
    pub fn new(audit_table: &str) -> Result<Self> {
        Ok(Self {
            audit_table: quote_qualified(audit_table)?,
        })
    }

    pub fn build(&self, record: &AuditRecord) -> Result<AuditWrite> {
        let reference = record.reference.as_ref();
        let column_reference = reference.map(|r| r.column.clone());
        let operator_reference = reference.map(|r| r.operator.as_sql().to_string());
        let value_reference = reference.map(|r| r.value.clone());

        let mut params = vec![
            (":action", Some(record.action.as_str().to_string())),
            (":table", Some(record.table.to_string())),
        ];

        let columns: &[&str] = match record.action {
            Action::Insert => {
                params.push((":column", record.column.clone()));
                params.push((":newValue", record.new_value.clone()));
                &["action", "table", "column", "newValue"]
            }
            Action::Delete => {
                params.push((":columnReference", column_reference));
                params.push((":operatorReference", operator_reference));
                params.push((":valueReference", value_reference));
                &["action", "table", "columnReference", "operatorReference", "valueReference"]
            }
            Action::Update => {
                params.push((":column", record.column.clone()));
                params.push((":newValue", record.new_value.clone()));
                params.push((":columnReference", column_reference));
                params.push((":operatorReference", operator_reference));
                params.push((":valueReference", value_reference));
                &AUDIT_COLUMNS[..7]
            }
        };

        params.push((":userId", Some(record.user_id.clone())));
        params.push((":ip", Some(record.ip.clone())));
        params.push((":userAgent", Some(record.user_agent.clone())));
        params.push((":system", Some(record.system.clone())));

        let mut column_list = columns
            .iter()
            .chain(["userId", "ip", "userAgent", "system"].iter())
            .map(|c| quote_identifier(c))
            .collect::<Result<Vec<_>>>()?;
        let mut placeholders: Vec<String> = params.iter().map(|(key, _)| key.to_string()).collect();

        if record.action == Action::Update {
            column_list.push(quote_identifier("oldValue")?);
            placeholders.push(self.old_value_lookup(record)?);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.audit_table,
            column_list.join(", "),
            placeholders.join(", ")
        );

        Ok(AuditWrite { sql, params })
    }

    /// Correlated subquery reading the current value of the updated column
    fn old_value_lookup(&self, record: &AuditRecord) -> Result<String> {
        let (Some(column), Some(reference)) = (record.column.as_deref(), record.reference.as_ref())
        else {
            return Ok("NULL".to_string());
        };

        let table = quote_table(&record.table)?;
        Ok(format!(
            "(SELECT {table}.{column} FROM {table} WHERE {table}.{reference_column} {operator} :valueReference LIMIT 1)",
            table = table,
            column = quote_identifier(column)?,
            reference_column = quote_identifier(&reference.column)?,
            operator = reference.operator.as_sql(),
        ))
    }
}

impl Default for AuditGateway {
    fn default() -> Self {
        Self {
            audit_table: format!("\"{}\"", DEFAULT_AUDIT_TABLE),
        }
    }
}

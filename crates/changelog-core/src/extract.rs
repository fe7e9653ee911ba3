//! Extraction engine
//!
//! Turns one parsed statement into the audit records it implies:
//!
//! - INSERT: one record per declared column, in column order
//! - UPDATE: one record per SET assignment, all sharing the WHERE reference
//! - DELETE: exactly one row-level record carrying the WHERE reference
//! - anything else: nothing
//!
//! Records are built before policy filtering; the caller decides which of
//! them are written.

use crate::context::AuditContext;
use crate::record::{Action, AuditRecord, TableName};
use crate::statement::{DeleteStatement, InsertStatement, ParsedStatement, UpdateStatement};
use tracing::warn;

/// Build the candidate audit records for `statement`
pub fn extract(statement: &ParsedStatement, context: &AuditContext, system: &str) -> Vec<AuditRecord> {
    match statement {
        ParsedStatement::Insert(insert) => extract_insert(insert, context, system),
        ParsedStatement::Update(update) => extract_update(update, context, system),
        ParsedStatement::Delete(delete) => extract_delete(delete, context, system),
        ParsedStatement::Other => Vec::new(),
    }
}

fn has_table(table: &TableName, action: Action) -> bool {
    if table.is_empty() {
        warn!(action = %action, "Statement has no target table, nothing to log");
        return false;
    }
    true
}

fn extract_insert(insert: &InsertStatement, context: &AuditContext, system: &str) -> Vec<AuditRecord> {
    if !has_table(&insert.table, Action::Insert) {
        return Vec::new();
    }
    if insert.columns.is_empty() {
        warn!(table = %insert.table, "INSERT without a column list, nothing to log");
        return Vec::new();
    }
    if insert.values.is_empty() {
        warn!(table = %insert.table, "INSERT without VALUES rows, new values are unknown");
    } else if insert.values.len() != insert.columns.len() {
        warn!(
            table = %insert.table,
            columns = insert.columns.len(),
            values = insert.values.len(),
            "INSERT column and value counts differ"
        );
    }

    insert
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = insert.values.get(i).cloned().flatten();
            AuditRecord::new(Action::Insert, insert.table.clone(), context, system)
                .with_column(column.as_str(), value)
        })
        .collect()
}

fn extract_update(update: &UpdateStatement, context: &AuditContext, system: &str) -> Vec<AuditRecord> {
    if !has_table(&update.table, Action::Update) {
        return Vec::new();
    }
    if update.condition.is_none() {
        warn!(table = %update.table, "UPDATE without a simple WHERE comparison, old values are not captured");
    }

    update
        .assignments
        .iter()
        .map(|assignment| {
            AuditRecord::new(Action::Update, update.table.clone(), context, system)
                .with_column(assignment.column.as_str(), assignment.value.clone())
                .with_reference(update.condition.clone())
        })
        .collect()
}

fn extract_delete(delete: &DeleteStatement, context: &AuditContext, system: &str) -> Vec<AuditRecord> {
    if !has_table(&delete.table, Action::Delete) {
        return Vec::new();
    }
    if delete.condition.is_none() {
        warn!(table = %delete.table, "DELETE without a simple WHERE comparison");
    }

    vec![AuditRecord::new(Action::Delete, delete.table.clone(), context, system)
        .with_reference(delete.condition.clone())]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::record::{ComparisonOp, WhereCondition};
    use crate::statement::{ColumnAssignment, SqlStatementParser, StatementParser};
    use proptest::prelude::*;

    fn records(sql: &str) -> Vec<AuditRecord> {
        let parsed = SqlStatementParser::default().parse(sql).unwrap();
        extract(&parsed, &AuditContext::new(3), "CRM")
    }

    #[test]
    fn test_insert_one_record_per_column() {
        let records = records("INSERT INTO user (login, name, note) VALUES ('bob', 'Bob', NULL)");
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.action == Action::Insert && r.table == "user"));
        assert_eq!(records[0].column.as_deref(), Some("login"));
        assert_eq!(records[1].new_value.as_deref(), Some("Bob"));
        assert_eq!(records[2].new_value, None);
        assert!(records.iter().all(|r| r.reference.is_none()));
        assert_eq!(records[0].user_id, "3");
        assert_eq!(records[0].system, "CRM");
    }

    #[test]
    fn test_insert_select_keeps_columns_without_values() {
        let records = records("INSERT INTO t (a, b) SELECT a, b FROM s");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.new_value.is_none()));
    }

    #[test]
    fn test_update_shares_reference() {
        let records = records("UPDATE user SET name = 'Bob', login = 'bob' WHERE id = 5");
        let reference = Some(WhereCondition::new("id", ComparisonOp::Eq, "5"));

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.reference == reference));
        assert_eq!(records[0].column.as_deref(), Some("name"));
        assert_eq!(records[1].new_value.as_deref(), Some("bob"));
    }

    #[test]
    fn test_delete_is_single_row_record() {
        let records = records("DELETE FROM orders WHERE status = 'cancelled'");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, Action::Delete);
        assert_eq!(records[0].column, None);
        assert_eq!(records[0].new_value, None);
        assert_eq!(
            records[0].reference,
            Some(WhereCondition::new("status", ComparisonOp::Eq, "cancelled"))
        );
    }

    #[test]
    fn test_other_statements_yield_nothing() {
        assert!(records("SELECT * FROM user WHERE id = 1").is_empty());
        assert!(records("DROP TABLE user").is_empty());
    }

    #[test]
    fn test_empty_table_yields_nothing() {
        let statement = ParsedStatement::Delete(DeleteStatement {
            table: TableName::default(),
            condition: None,
        });
        assert!(extract(&statement, &AuditContext::default(), "CRM").is_empty());
    }

    proptest! {
        #[test]
        fn prop_update_yields_one_record_per_assignment(
            columns in proptest::collection::vec("[a-z]{1,8}", 1..8),
        ) {
            let statement = ParsedStatement::Update(UpdateStatement {
                table: "t".into(),
                assignments: columns
                    .iter()
                    .map(|c| ColumnAssignment { column: c.clone(), value: Some("1".to_string()) })
                    .collect(),
                condition: Some(WhereCondition::new("id", ComparisonOp::Eq, "1")),
            });
            let records = extract(&statement, &AuditContext::default(), "CRM");
            prop_assert_eq!(records.len(), columns.len());
        }

        #[test]
        fn prop_insert_yields_one_record_per_column(
            columns in proptest::collection::vec("[a-z]{1,8}", 1..8),
            values in 0usize..10,
        ) {
            let statement = ParsedStatement::Insert(InsertStatement {
                table: "t".into(),
                columns: columns.clone(),
                values: (0..values).map(|i| Some(i.to_string())).collect(),
            });
            let records = extract(&statement, &AuditContext::default(), "CRM");
            prop_assert_eq!(records.len(), columns.len());
        }
    }
}

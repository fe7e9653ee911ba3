//! Statement parsing
//!
//! SQL text is turned into exactly one [`ParsedStatement`] variant. The
//! generic SQL grammar is delegated to `sqlparser`; this module only
//! projects its AST onto the shapes the extraction engine needs.

use crate::error::{ChangeLogError, Result};
use crate::record::{ComparisonOp, TableName, WhereCondition};
use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    AssignmentTarget, BinaryOperator, Expr, FromTable, Ident, ObjectName, SetExpr, Statement,
    TableFactor, TableWithJoins, UnaryOperator, Value,
};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use tracing::debug;

/// SQL dialect used to parse incoming statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Generic,
    MySql,
    Postgres,
    Sqlite,
}

impl SqlDialect {
    fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::MySql => Box::new(MySqlDialect {}),
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
        }
    }
}

impl std::str::FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "ansi" => Ok(SqlDialect::Generic),
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" | "pgsql" => Ok(SqlDialect::Postgres),
            "sqlite" => Ok(SqlDialect::Sqlite),
            other => Err(format!("unknown SQL dialect '{}'", other)),
        }
    }
}

/// INSERT projected to its first VALUES row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub table: TableName,
    /// Declared column list, in order
    pub columns: Vec<String>,
    /// Literal text of the first VALUES row; `None` for SQL NULL
    pub values: Vec<Option<String>>,
}

/// One `column = value` pair of a SET clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAssignment {
    pub column: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
    pub table: TableName,
    pub assignments: Vec<ColumnAssignment>,
    pub condition: Option<WhereCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatement {
    pub table: TableName,
    pub condition: Option<WhereCondition>,
}

/// A statement classified by mutation kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedStatement {
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    /// SELECT, DDL and anything else that is not audited
    Other,
}

impl ParsedStatement {
    pub fn kind(&self) -> &'static str {
        match self {
            ParsedStatement::Insert(_) => "insert",
            ParsedStatement::Update(_) => "update",
            ParsedStatement::Delete(_) => "delete",
            ParsedStatement::Other => "other",
        }
    }
}

/// Converts SQL text into a [`ParsedStatement`]
pub trait StatementParser: Send + Sync {
    fn parse(&self, sql: &str) -> Result<ParsedStatement>;
}

/// [`StatementParser`] backed by `sqlparser`
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlStatementParser {
    dialect: SqlDialect,
}

impl SqlStatementParser {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }
}

impl StatementParser for SqlStatementParser {
    fn parse(&self, sql: &str) -> Result<ParsedStatement> {
        let dialect = self.dialect.dialect();
        let mut statements = Parser::parse_sql(dialect.as_ref(), sql)
            .map_err(|e| ChangeLogError::parse(sql, e.to_string()))?;

        let statement = match statements.len() {
            0 => return Err(ChangeLogError::parse(sql, "no statement found")),
            1 => statements.remove(0),
            count => return Err(ChangeLogError::AmbiguousStatement { count }),
        };

        let parsed = classify(&statement);
        debug!(kind = parsed.kind(), dialect = ?self.dialect, "Parsed statement");
        Ok(parsed)
    }
}

fn classify(statement: &Statement) -> ParsedStatement {
    match statement {
        Statement::Insert(insert) => {
            let values = insert
                .source
                .as_deref()
                .and_then(|query| match query.body.as_ref() {
                    SetExpr::Values(values) => values.rows.first(),
                    _ => None,
                })
                .map(|row| row.iter().map(literal_text).collect())
                .unwrap_or_default();

            ParsedStatement::Insert(InsertStatement {
                table: object_name(&insert.table_name),
                columns: insert.columns.iter().map(|c| c.value.clone()).collect(),
                values,
            })
        }
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => ParsedStatement::Update(UpdateStatement {
            table: table_name(table),
            assignments: assignments
                .iter()
                .flat_map(|a| column_assignments(&a.target, &a.value))
                .collect(),
            condition: selection.as_ref().and_then(first_comparison),
        }),
        Statement::Delete(delete) => {
            let tables = match &delete.from {
                FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
            };
            let table = tables
                .first()
                .map(table_name)
                .or_else(|| delete.tables.first().map(object_name))
                .unwrap_or_default();

            ParsedStatement::Delete(DeleteStatement {
                table,
                condition: delete.selection.as_ref().and_then(first_comparison),
            })
        }
        _ => ParsedStatement::Other,
    }
}

fn object_name(name: &ObjectName) -> TableName {
    TableName::new(name.0.iter().map(|ident| ident.value.as_str()))
}

/// Plain table identifier, or the raw relation text when it is not one
fn table_name(table: &TableWithJoins) -> TableName {
    match &table.relation {
        TableFactor::Table { name, .. } => object_name(name),
        other => TableName::from(other.to_string()),
    }
}

fn last_ident(idents: &[Ident]) -> Option<String> {
    idents.last().map(|ident| ident.value.clone())
}

fn column_assignments(target: &AssignmentTarget, value: &Expr) -> Vec<ColumnAssignment> {
    match target {
        AssignmentTarget::ColumnName(name) => last_ident(&name.0)
            .map(|column| ColumnAssignment {
                column,
                value: literal_text(value),
            })
            .into_iter()
            .collect(),
        AssignmentTarget::Tuple(names) => {
            let values: Vec<Option<String>> = match value {
                Expr::Tuple(items) if items.len() == names.len() => {
                    items.iter().map(literal_text).collect()
                }
                other => vec![literal_text(other); names.len()],
            };
            names
                .iter()
                .zip(values)
                .filter_map(|(name, value)| {
                    last_ident(&name.0).map(|column| ColumnAssignment { column, value })
                })
                .collect()
        }
    }
}

/// Literal text of an expression, unquoted; `None` for SQL NULL
fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(Value::Null) => None,
        Expr::Value(
            Value::SingleQuotedString(s)
            | Value::DoubleQuotedString(s)
            | Value::NationalStringLiteral(s)
            | Value::EscapedStringLiteral(s),
        ) => Some(s.clone()),
        Expr::Value(Value::Number(n, _)) => Some(n.clone()),
        Expr::Value(Value::Boolean(b)) => Some(b.to_string()),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match expr.as_ref() {
            Expr::Value(Value::Number(n, _)) => Some(format!("-{}", n)),
            other => Some(format!("-{}", other)),
        },
        Expr::Nested(inner) => literal_text(inner),
        other => Some(other.to_string()),
    }
}

fn column_of(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(idents) => last_ident(idents),
        Expr::Nested(inner) => column_of(inner),
        _ => None,
    }
}

/// Leftmost `column <op> value` comparison of a WHERE expression
///
/// AND/OR trees are searched left-first; everything past the first match
/// is ignored.
fn first_comparison(expr: &Expr) -> Option<WhereCondition> {
    match expr {
        Expr::Nested(inner) => first_comparison(inner),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And | BinaryOperator::Or,
            right,
        } => first_comparison(left).or_else(|| first_comparison(right)),
        Expr::BinaryOp { left, op, right } => {
            let operator = ComparisonOp::from_binary(op)?;
            let column = column_of(left)?;
            let value = literal_text(right).unwrap_or_else(|| "NULL".to_string());
            Some(WhereCondition::new(column, operator, value))
        }
        Expr::Like {
            negated,
            expr,
            pattern,
            ..
        } => {
            let column = column_of(expr)?;
            let operator = if *negated {
                ComparisonOp::NotLike
            } else {
                ComparisonOp::Like
            };
            let value = literal_text(pattern).unwrap_or_else(|| "NULL".to_string());
            Some(WhereCondition::new(column, operator, value))
        }
        _ => None,
    }
}

//! Audit record types

use crate::context::AuditContext;
use serde::{Deserialize, Serialize};
use sqlparser::ast::BinaryOperator;

/// Kind of data mutation being audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Insert,
    Update,
    Delete,
}

impl Action {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(Action::Insert),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(format!(
                "unknown action '{}', expected insert, update or delete",
                other
            )),
        }
    }
}

/// Comparison operators that can locate the affected row(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
}

impl ComparisonOp {
    /// SQL spelling, safe to splice into a statement
    pub fn as_sql(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
            ComparisonOp::Like => "LIKE",
            ComparisonOp::NotLike => "NOT LIKE",
        }
    }

    /// Map a parsed binary operator, `None` for non-comparisons
    pub fn from_binary(op: &BinaryOperator) -> Option<Self> {
        match op {
            BinaryOperator::Eq => Some(ComparisonOp::Eq),
            BinaryOperator::NotEq => Some(ComparisonOp::NotEq),
            BinaryOperator::Lt => Some(ComparisonOp::Lt),
            BinaryOperator::LtEq => Some(ComparisonOp::LtEq),
            BinaryOperator::Gt => Some(ComparisonOp::Gt),
            BinaryOperator::GtEq => Some(ComparisonOp::GtEq),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Table identifier as written in the statement, one entry per name part
///
/// `crm.user` has two parts while `"my.table"` has one. Displays dotted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TableName(Vec<String>);

impl TableName {
    /// Name from its parts, outermost (schema) first
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|part| part.is_empty())
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A single unqualified identifier
impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<String> for TableName {
    fn from(name: String) -> Self {
        if name.is_empty() {
            Self::default()
        } else {
            Self(vec![name])
        }
    }
}

impl PartialEq<&str> for TableName {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl Serialize for TableName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TableName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// The `column <op> value` triplet taken from a WHERE clause
///
/// Only one comparison is tracked per statement. For compound conditions
/// this is the leftmost simple comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereCondition {
    pub column: String,
    pub operator: ComparisonOp,
    pub value: String,
}

impl WhereCondition {
    pub fn new(column: impl Into<String>, operator: ComparisonOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
}

/// A single logged fact about one changed column or one deleted row
///
/// The pre-change value of an update is not part of the record: the
/// persistence gateway looks it up while writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub action: Action,

    /// Mutated table
    pub table: TableName,

    /// Changed column, absent for row-level deletes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// Literal value written, `None` for SQL NULL and for deletes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,

    /// Condition locating the affected row(s), update and delete only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<WhereCondition>,

    pub user_id: String,
    pub ip: String,
    pub user_agent: String,

    /// Label of the logging subsystem instance
    pub system: String,
}

impl AuditRecord {
    /// Create a record for `table` attributed to the actor in `context`
    pub fn new(action: Action, table: impl Into<TableName>, context: &AuditContext, system: &str) -> Self {
        Self {
            action,
            table: table.into(),
            column: None,
            new_value: None,
            reference: None,
            user_id: context.user_id.clone(),
            ip: context.ip.clone(),
            user_agent: context.user_agent.clone(),
            system: system.to_string(),
        }
    }

    /// Set the changed column and its new value
    pub fn with_column(mut self, column: impl Into<String>, new_value: Option<String>) -> Self {
        self.column = Some(column.into());
        self.new_value = new_value;
        self
    }

    /// Set the WHERE-clause reference
    pub fn with_reference(mut self, reference: Option<WhereCondition>) -> Self {
        self.reference = reference;
        self
    }
}

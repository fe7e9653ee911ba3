//! Logging policy
//!
//! Per-table allow-list deciding which actions and columns are audited.
//! The YAML form mirrors the rules directly:
//!
//! ```yaml
//! user:
//!   insert: [login, name, password]
//!   delete: all
//!   update: [login, name]
//! customers: all
//! ```
//!
//! An empty policy logs everything. A table missing from a non-empty policy
//! is never logged.

use crate::error::{ChangeLogError, Result};
use crate::record::Action;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Keyword that allows every action or column
pub const ALL: &str = "all";

/// Rule for one action of a table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawActionRule")]
pub enum ActionRule {
    All,
    Columns(BTreeSet<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawActionRule {
    One(String),
    Many(Vec<String>),
}

impl From<RawActionRule> for ActionRule {
    fn from(raw: RawActionRule) -> Self {
        match raw {
            RawActionRule::One(value) if value == ALL => ActionRule::All,
            // A bare column name is a one-element list
            RawActionRule::One(column) => ActionRule::Columns(BTreeSet::from([column])),
            RawActionRule::Many(columns) => ActionRule::Columns(columns.into_iter().collect()),
        }
    }
}

/// Rule for one table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTableRule")]
pub enum TableRule {
    All,
    Actions(BTreeMap<Action, ActionRule>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTableRule {
    Keyword(String),
    Actions(BTreeMap<Action, ActionRule>),
}

impl TryFrom<RawTableRule> for TableRule {
    type Error = String;

    fn try_from(raw: RawTableRule) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawTableRule::Keyword(value) if value == ALL => Ok(TableRule::All),
            RawTableRule::Keyword(value) => Err(format!(
                "expected '{}' or a map of actions, found '{}'",
                ALL, value
            )),
            RawTableRule::Actions(actions) => Ok(TableRule::Actions(actions)),
        }
    }
}

/// Table → rule mapping, read-only once a change log is built
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LoggingPolicy {
    tables: BTreeMap<String, TableRule>,
}

impl LoggingPolicy {
    /// Policy that logs every table, action and column
    pub fn log_everything() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ChangeLogError::invalid_policy(e.to_string()))
    }

    /// Load a policy from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChangeLogError::invalid_policy(format!(
                "cannot read policy file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Log every action on `table`
    pub fn allow_table(mut self, table: impl Into<String>) -> Self {
        self.tables.insert(table.into(), TableRule::All);
        self
    }

    /// Log every column for `action` on `table`
    pub fn allow_action(self, table: impl Into<String>, action: Action) -> Self {
        self.set_action_rule(table.into(), action, ActionRule::All)
    }

    /// Log only `columns` for `action` on `table`
    pub fn allow_columns<I, S>(self, table: impl Into<String>, action: Action, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.set_action_rule(table.into(), action, ActionRule::Columns(columns))
    }

    fn set_action_rule(mut self, table: String, action: Action, rule: ActionRule) -> Self {
        let entry = self
            .tables
            .entry(table)
            .or_insert_with(|| TableRule::Actions(BTreeMap::new()));
        if let TableRule::Actions(actions) = entry {
            actions.insert(action, rule);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Decide whether a change should be written
    ///
    /// `column` is `None` for row-level deletes, which pass only through a
    /// table-level or action-level `all`.
    pub fn should_log(&self, table: &str, action: Action, column: Option<&str>) -> bool {
        if self.tables.is_empty() {
            return true;
        }

        let actions = match self.tables.get(table) {
            None => return false,
            Some(TableRule::All) => return true,
            Some(TableRule::Actions(actions)) => actions,
        };

        match (actions.get(&action), column) {
            (None, _) => false,
            (Some(ActionRule::All), _) => true,
            (Some(ActionRule::Columns(_)), None) => false,
            (Some(ActionRule::Columns(columns)), Some(column)) => columns.contains(column),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EXAMPLE: &str = r#"
user:
  insert: [login, name, password]
  delete: all
  update: [login, name]
customers: all
"#;

    #[test]
    fn test_example_policy() {
        let policy = LoggingPolicy::from_yaml_str(EXAMPLE).unwrap();

        assert!(!policy.should_log("user", Action::Insert, Some("email")));
        assert!(policy.should_log("user", Action::Insert, Some("login")));
        assert!(policy.should_log("user", Action::Delete, None));
        assert!(policy.should_log("user", Action::Update, Some("name")));
        assert!(!policy.should_log("user", Action::Update, Some("password")));
        assert!(policy.should_log("customers", Action::Delete, None));
        assert!(policy.should_log("customers", Action::Insert, Some("anything")));
        assert!(!policy.should_log("orders", Action::Insert, Some("x")));
    }

    #[test]
    fn test_missing_action_is_rejected() {
        let policy = LoggingPolicy::default().allow_columns("user", Action::Insert, ["login"]);
        assert!(!policy.should_log("user", Action::Update, Some("login")));
        assert!(!policy.should_log("user", Action::Delete, None));
    }

    #[test]
    fn test_delete_with_column_list_is_rejected() {
        let policy = LoggingPolicy::default().allow_columns("user", Action::Delete, ["id"]);
        assert!(!policy.should_log("user", Action::Delete, None));
    }

    #[test]
    fn test_builder_matches_yaml() {
        let built = LoggingPolicy::default()
            .allow_columns("user", Action::Insert, ["login", "name", "password"])
            .allow_action("user", Action::Delete)
            .allow_columns("user", Action::Update, ["login", "name"])
            .allow_table("customers");
        assert_eq!(built, LoggingPolicy::from_yaml_str(EXAMPLE).unwrap());
    }

    #[test]
    fn test_single_column_string() {
        let policy = LoggingPolicy::from_yaml_str("user:\n  update: login\n").unwrap();
        assert!(policy.should_log("user", Action::Update, Some("login")));
        assert!(!policy.should_log("user", Action::Update, Some("name")));
    }

    #[test]
    fn test_invalid_policies() {
        assert!(LoggingPolicy::from_yaml_str("user: some").is_err());
        assert!(LoggingPolicy::from_yaml_str("user:\n  select: all\n").is_err());
        assert!(LoggingPolicy::from_yaml_str("- user\n").is_err());
    }

    #[test]
    fn test_empty_document_is_empty_policy() {
        assert!(LoggingPolicy::from_yaml_str("").unwrap().is_empty());
        assert!(LoggingPolicy::from_yaml_str("{}").unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yml");
        std::fs::write(&path, EXAMPLE).unwrap();

        let policy = LoggingPolicy::load(&path).unwrap();
        assert!(policy.should_log("customers", Action::Update, Some("x")));

        let missing = LoggingPolicy::load(dir.path().join("missing.yml"));
        assert!(matches!(missing, Err(ChangeLogError::InvalidPolicy(_))));
    }

    fn action_strategy() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::Insert),
            Just(Action::Update),
            Just(Action::Delete)
        ]
    }

    proptest! {
        #[test]
        fn prop_empty_policy_logs_everything(
            table in "[a-z_]{1,12}",
            action in action_strategy(),
            column in proptest::option::of("[a-z_]{1,12}"),
        ) {
            let policy = LoggingPolicy::log_everything();
            prop_assert!(policy.should_log(&table, action, column.as_deref()));
        }

        #[test]
        fn prop_should_log_is_pure(
            table in prop_oneof![Just("user".to_string()), Just("customers".to_string()), "[a-z]{1,8}"],
            action in action_strategy(),
            column in proptest::option::of(prop_oneof![Just("login".to_string()), "[a-z]{1,8}"]),
        ) {
            let policy = LoggingPolicy::from_yaml_str(EXAMPLE).unwrap();
            let first = policy.should_log(&table, action, column.as_deref());
            let second = policy.should_log(&table, action, column.as_deref());
            prop_assert_eq!(first, second);
        }
    }
}

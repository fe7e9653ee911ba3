//! Configuration management

use crate::error::{ChangeLogError, Result};
use crate::gateway::{quote_qualified, DEFAULT_AUDIT_TABLE};
use crate::policy::LoggingPolicy;
use crate::statement::SqlDialect;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default SQLite database file holding the audit table.
pub const DEFAULT_DATABASE_PATH: &str = "changelog.db";

/// Default label written to the `system` column.
pub const DEFAULT_SYSTEM_NAME: &str = "CRM";

pub const ENV_DATABASE: &str = "CHANGELOG_DATABASE";
pub const ENV_SYSTEM_NAME: &str = "CHANGELOG_SYSTEM_NAME";
pub const ENV_POLICY_FILE: &str = "CHANGELOG_POLICY_FILE";
pub const ENV_AUDIT_TABLE: &str = "CHANGELOG_AUDIT_TABLE";
pub const ENV_DIALECT: &str = "CHANGELOG_DIALECT";

/// Immutable engine configuration
///
/// Built once and handed to [`crate::ChangeLog::new`]; there is no way to
/// change the policy or system name of a running change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogConfig {
    pub policy: LoggingPolicy,
    pub system_name: String,
    pub audit_table: String,
    pub dialect: SqlDialect,
}

impl ChangeLogConfig {
    pub fn new(policy: LoggingPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_system_name(mut self, system_name: impl Into<String>) -> Self {
        self.system_name = system_name.into();
        self
    }

    pub fn with_audit_table(mut self, audit_table: impl Into<String>) -> Self {
        self.audit_table = audit_table.into();
        self
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.system_name.trim().is_empty() {
            return Err(ChangeLogError::config("System name cannot be empty"));
        }
        quote_qualified(&self.audit_table)?;
        Ok(())
    }
}

impl Default for ChangeLogConfig {
    fn default() -> Self {
        Self {
            policy: LoggingPolicy::log_everything(),
            system_name: DEFAULT_SYSTEM_NAME.to_string(),
            audit_table: DEFAULT_AUDIT_TABLE.to_string(),
            dialect: SqlDialect::default(),
        }
    }
}

/// Deployment settings resolved from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: PathBuf,
    pub system_name: String,
    pub policy_file: Option<PathBuf>,
    pub audit_table: String,
    pub dialect: SqlDialect,
}

impl Settings {
    /// Load settings from environment (and `.env`) with defaults
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| Ok(changelog_common::env::var(name)?))
    }

    fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<Option<String>>,
    {
        let dialect = match lookup(ENV_DIALECT)? {
            Some(raw) => raw.trim().parse::<SqlDialect>().map_err(|reason| {
                changelog_common::CommonError::invalid_env_value(ENV_DIALECT, raw.clone(), reason)
            })?,
            None => SqlDialect::default(),
        };

        let settings = Settings {
            database: lookup(ENV_DATABASE)?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            system_name: lookup(ENV_SYSTEM_NAME)?
                .unwrap_or_else(|| DEFAULT_SYSTEM_NAME.to_string()),
            policy_file: lookup(ENV_POLICY_FILE)?.map(PathBuf::from),
            audit_table: lookup(ENV_AUDIT_TABLE)?
                .unwrap_or_else(|| DEFAULT_AUDIT_TABLE.to_string()),
            dialect,
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.database.as_os_str().is_empty() {
            return Err(ChangeLogError::config("Database path cannot be empty"));
        }

        if self.system_name.trim().is_empty() {
            return Err(ChangeLogError::config("System name cannot be empty"));
        }

        quote_qualified(&self.audit_table)
            .map_err(|_| ChangeLogError::config(format!("Invalid audit table '{}'", self.audit_table)))?;

        if let Some(path) = self.policy_file.as_ref() {
            if !path.exists() {
                return Err(ChangeLogError::config(format!(
                    "Policy file '{}' does not exist",
                    path.display()
                )));
            }
        } else {
            tracing::info!("No logging policy configured - every table will be logged");
        }

        Ok(())
    }

    /// Engine configuration, loading the policy file if one is set
    pub fn changelog_config(&self) -> Result<ChangeLogConfig> {
        let policy = match self.policy_file.as_ref() {
            Some(path) => LoggingPolicy::load(path)?,
            None => LoggingPolicy::log_everything(),
        };

        Ok(ChangeLogConfig::new(policy)
            .with_system_name(self.system_name.as_str())
            .with_audit_table(self.audit_table.as_str())
            .with_dialect(self.dialect))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE_PATH),
            system_name: DEFAULT_SYSTEM_NAME.to_string(),
            policy_file: None,
            audit_table: DEFAULT_AUDIT_TABLE.to_string(),
            dialect: SqlDialect::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::record::Action;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_vars(|name| Ok(vars.get(name).cloned()))
    }

    #[test]
    fn test_defaults() {
        let settings = from_map(&[]).unwrap();
        assert_eq!(settings.database, PathBuf::from("changelog.db"));
        assert_eq!(settings.system_name, "CRM");
        assert_eq!(settings.audit_table, "data_change_log");
        assert_eq!(settings.dialect, SqlDialect::Generic);
        assert!(settings.policy_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = from_map(&[
            (ENV_DATABASE, "/tmp/audit.db"),
            (ENV_SYSTEM_NAME, "Billing"),
            (ENV_AUDIT_TABLE, "audit.changes"),
            (ENV_DIALECT, "mysql"),
        ])
        .unwrap();
        assert_eq!(settings.system_name, "Billing");
        assert_eq!(settings.audit_table, "audit.changes");
        assert_eq!(settings.dialect, SqlDialect::MySql);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            from_map(&[(ENV_DIALECT, "oracle")]),
            Err(ChangeLogError::Environment(_))
        ));
        assert!(matches!(
            from_map(&[(ENV_AUDIT_TABLE, "a..b")]),
            Err(ChangeLogError::Config(_))
        ));
        assert!(matches!(
            from_map(&[(ENV_POLICY_FILE, "/definitely/missing/policy.yml")]),
            Err(ChangeLogError::Config(_))
        ));
    }

    #[test]
    fn test_changelog_config_loads_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yml");
        std::fs::write(&path, "user:\n  delete: all\n").unwrap();

        let settings = Settings {
            policy_file: Some(path),
            system_name: "Billing".to_string(),
            ..Settings::default()
        };
        let config = settings.changelog_config().unwrap();

        assert_eq!(config.system_name, "Billing");
        assert!(config.policy.should_log("user", Action::Delete, None));
        assert!(!config.policy.should_log("orders", Action::Delete, None));
    }

    #[test]
    fn test_config_validation() {
        assert!(ChangeLogConfig::default().validate().is_ok());
        assert!(ChangeLogConfig::default()
            .with_system_name(" ")
            .validate()
            .is_err());
        assert!(ChangeLogConfig::default()
            .with_audit_table("")
            .validate()
            .is_err());
    }
}

//! Changelog Core Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Column-level audit trail for data-mutating SQL statements.
//!
//! # Overview
//!
//! Every INSERT, UPDATE and DELETE passed to [`ChangeLog::log`] is parsed and
//! turned into audit records that answer "who changed what, from what to
//! what, from where":
//!
//! - **Interpolation**: bound parameters are spliced back into the SQL text
//! - **Parsing**: the statement is classified as insert, update, delete or other
//! - **Extraction**: one record per changed column, one per deleted statement
//! - **Policy**: a per-table allow-list filters records before writing
//! - **Persistence**: records become parameterized INSERTs into the audit table,
//!   updates capturing the pre-change value with a correlated lookup
//!
//! # Example
//!
//! ```no_run
//! use changelog_core::{AuditContext, ChangeLog, ChangeLogConfig};
//!
//! # fn main() -> changelog_core::Result<()> {
//! let mut changelog = ChangeLog::new(ChangeLogConfig::default())?;
//! changelog.connect("changelog.db")?;
//!
//! let actor = AuditContext::new(42).with_ip("10.0.0.1");
//! changelog.log("UPDATE user SET name = 'Bob' WHERE id = 5", None, &actor)?;
//! # Ok(())
//! # }
//! ```

pub mod changelog;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod params;
pub mod policy;
pub mod record;
pub mod statement;
pub mod store;

// Re-export commonly used types
pub use changelog::{ChangeLog, LogSummary};
pub use config::{ChangeLogConfig, Settings};
pub use context::{AuditContext, ContextProvider, RequestContext};
pub use error::{ChangeLogError, Result};
pub use params::{ParamValue, Params};
pub use policy::LoggingPolicy;
pub use record::{Action, AuditRecord, ComparisonOp, TableName, WhereCondition};
pub use statement::{ParsedStatement, SqlDialect};
pub use store::{AuditQuery, AuditSink, SqliteAuditStore, StoredRecord};

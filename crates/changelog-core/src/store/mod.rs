//! Audit store
//!
//! The engine writes through the [`AuditSink`] trait. [`SqliteAuditStore`]
//! is the bundled implementation; it shares the connection with the audited
//! tables so the old-value lookup sees live data.

pub mod schema;
pub mod sqlite;

pub use sqlite::{AuditQuery, SqliteAuditStore, StoredRecord};

use crate::error::Result;
use crate::gateway::AuditWrite;

/// Executes prepared audit writes (dependency injection)
pub trait AuditSink: Send + Sync {
    /// Execute one write, returning the number of rows inserted
    fn execute(&self, write: &AuditWrite) -> Result<usize>;
}

//! Change log engine
//!
//! Wires the pipeline together: interpolate → parse → extract → policy →
//! gateway → sink. Each `log` call is independent and synchronous; the
//! engine only holds its immutable configuration and the attached sink.

use crate::config::ChangeLogConfig;
use crate::context::ContextProvider;
use crate::error::{ChangeLogError, Result};
use crate::extract::extract;
use crate::gateway::AuditGateway;
use crate::params::{interpolate, Params};
use crate::record::AuditRecord;
use crate::statement::{SqlStatementParser, StatementParser};
use crate::store::{AuditSink, SqliteAuditStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one `log` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    /// Records written to the audit store
    pub written: usize,
    /// Records rejected by the logging policy
    pub skipped: usize,
}

impl LogSummary {
    /// Number of records the statement produced before filtering
    pub fn attempted(&self) -> usize {
        self.written + self.skipped
    }
}

pub struct ChangeLog {
    config: ChangeLogConfig,
    parser: Box<dyn StatementParser>,
    gateway: AuditGateway,
    sink: Option<Arc<dyn AuditSink>>,
    connected: Option<PathBuf>,
}

impl ChangeLog {
    /// Build an engine without a sink; attach one with [`ChangeLog::connect`]
    /// or [`ChangeLog::with_sink`] before logging
    pub fn new(config: ChangeLogConfig) -> Result<Self> {
        config.validate()?;
        let gateway = AuditGateway::new(&config.audit_table)?;
        let parser = Box::new(SqlStatementParser::new(config.dialect));

        Ok(Self {
            config,
            parser,
            gateway,
            sink: None,
            connected: None,
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self.connected = None;
        self
    }

    pub fn with_parser(mut self, parser: Box<dyn StatementParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &ChangeLogConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.sink.is_some()
    }

    /// Open the SQLite audit store at `path`
    ///
    /// Returns `false` without reopening when already connected to the same
    /// path.
    pub fn connect(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        if self.connected.as_deref() == Some(path) {
            debug!(path = %path.display(), "Already connected to audit store");
            return Ok(false);
        }

        let store = SqliteAuditStore::open(path, &self.config.audit_table)?;
        self.sink = Some(Arc::new(store));
        self.connected = Some(path.to_path_buf());

        info!(path = %path.display(), audit_table = %self.config.audit_table, "Connected to audit store");
        Ok(true)
    }

    /// Record the changes made by one SQL statement
    ///
    /// Parse failures abort before anything is written. A persistence failure
    /// part way through a multi-column statement leaves the earlier records
    /// written.
    pub fn log<C>(&self, sql: &str, params: Option<&Params>, context: &C) -> Result<LogSummary>
    where
        C: ContextProvider + ?Sized,
    {
        let sql = match params {
            Some(params) if !params.is_empty() => interpolate(sql, params),
            _ => sql.to_string(),
        };

        let statement = self.parser.parse(&sql)?;
        let context = context.audit_context();
        let records = extract(&statement, &context, &self.config.system_name);

        let mut summary = LogSummary::default();
        for record in &records {
            if self.save(record)? {
                summary.written += 1;
            } else {
                summary.skipped += 1;
            }
        }

        debug!(
            kind = statement.kind(),
            written = summary.written,
            skipped = summary.skipped,
            "Statement logged"
        );
        Ok(summary)
    }

    /// Write one record if the policy allows it
    ///
    /// Returns `Ok(false)` when the policy rejects the record.
    pub fn save(&self, record: &AuditRecord) -> Result<bool> {
        if !self
            .config
            .policy
            .should_log(&record.table.to_string(), record.action, record.column.as_deref())
        {
            debug!(
                table = %record.table,
                action = %record.action,
                column = ?record.column,
                "Change excluded by logging policy"
            );
            return Ok(false);
        }

        let sink = self.sink.as_ref().ok_or(ChangeLogError::NotConfigured)?;
        let write = self.gateway.build(record)?;
        sink.execute(&write)?;

        info!(
            table = %record.table,
            action = %record.action,
            column = ?record.column,
            user_id = %record.user_id,
            "Change logged"
        );
        Ok(true)
    }
}

impl std::fmt::Debug for ChangeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeLog")
            .field("config", &self.config)
            .field("configured", &self.is_configured())
            .field("connected", &self.connected)
            .finish()
    }
}

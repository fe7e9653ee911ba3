//! SQLite audit store

use crate::error::{ChangeLogError, Result};
use crate::gateway::{quote_qualified, AuditWrite, DEFAULT_AUDIT_TABLE};
use crate::record::Action;
use crate::store::{schema, AuditSink};
use rusqlite::{Connection, ToSql};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Default number of records returned per query
pub const DEFAULT_AUDIT_QUERY_LIMIT: usize = 100;

/// Maximum number of records returned by a single query
pub const MAX_AUDIT_QUERY_LIMIT: usize = 1000;

/// A persisted audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: i64,
    pub created_at: String,
    pub action: String,
    pub table: String,
    pub column: Option<String>,
    pub new_value: Option<String>,
    pub old_value: Option<String>,
    pub column_reference: Option<String>,
    pub operator_reference: Option<String>,
    pub value_reference: Option<String>,
    pub user_id: String,
    pub ip: String,
    pub user_agent: String,
    pub system: String,
}

/// Filters for reading the trail back
#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub table: Option<String>,
    pub action: Option<Action>,
    pub user_id: Option<String>,
    pub limit: usize,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            table: None,
            action: None,
            user_id: None,
            limit: DEFAULT_AUDIT_QUERY_LIMIT,
        }
    }
}

/// Audit store on a SQLite connection
///
/// The connection is shared with the audited tables: the correlated
/// old-value lookup of an update reads them through it.
pub struct SqliteAuditStore {
    db: Mutex<Connection>,
    audit_table: String,
    path: Option<PathBuf>,
}

impl SqliteAuditStore {
    /// Open (or create) a database file and initialize the audit table
    pub fn open(path: impl AsRef<Path>, audit_table: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let mut store = Self::from_connection(conn, audit_table)?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// In-memory store with the default audit table
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, DEFAULT_AUDIT_TABLE)
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection, audit_table: &str) -> Result<Self> {
        schema::init_schema(&conn, audit_table)?;

        Ok(Self {
            db: Mutex::new(conn),
            audit_table: audit_table.to_string(),
            path: None,
        })
    }

    /// Database file, `None` for in-memory and wrapped connections
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn audit_table(&self) -> &str {
        &self.audit_table
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| ChangeLogError::Store(format!("Failed to acquire database lock: {}", e)))
    }

    /// Run `f` against the underlying connection
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.lock()?;
        Ok(f(&conn)?)
    }

    /// Read stored records, newest first
    pub fn query(&self, query: &AuditQuery) -> Result<Vec<StoredRecord>> {
        let limit = query.limit.clamp(1, MAX_AUDIT_QUERY_LIMIT);
        let action = query.action.map(|a| a.as_str());

        let mut conditions = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();

        if let Some(table) = query.table.as_ref() {
            params.push(table);
            conditions.push(format!("\"table\" = ?{}", params.len()));
        }
        if let Some(action) = action.as_ref() {
            params.push(action);
            conditions.push(format!("\"action\" = ?{}", params.len()));
        }
        if let Some(user_id) = query.user_id.as_ref() {
            params.push(user_id);
            conditions.push(format!("\"userId\" = ?{}", params.len()));
        }
        params.push(&limit);

        let mut sql = format!(
            r#"SELECT "id", "created_at", "action", "table", "column", "newValue", "oldValue",
                      "columnReference", "operatorReference", "valueReference",
                      "userId", "ip", "userAgent", "system"
               FROM {}"#,
            quote_qualified(&self.audit_table)?
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY \"id\" DESC LIMIT ?{}", params.len()));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok(StoredRecord {
                id: row.get(0)?,
                created_at: row.get(1)?,
                action: row.get(2)?,
                table: row.get(3)?,
                column: row.get(4)?,
                new_value: row.get(5)?,
                old_value: row.get(6)?,
                column_reference: row.get(7)?,
                operator_reference: row.get(8)?,
                value_reference: row.get(9)?,
                user_id: row.get(10)?,
                ip: row.get(11)?,
                user_agent: row.get(12)?,
                system: row.get(13)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl AuditSink for SqliteAuditStore {
    fn execute(&self, write: &AuditWrite) -> Result<usize> {
        let conn = self.lock()?;
        let params: Vec<(&str, &dyn ToSql)> = write
            .params
            .iter()
            .map(|(name, value)| (*name, value as &dyn ToSql))
            .collect();

        let inserted = conn.execute(&write.sql, params.as_slice())?;
        debug!(rows = inserted, row_id = conn.last_insert_rowid(), "Audit row inserted");
        Ok(inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context::AuditContext;
    use crate::gateway::AuditGateway;
    use crate::record::AuditRecord;

    fn write_insert(store: &SqliteAuditStore, table: &str, column: &str, user: &str) {
        let record = AuditRecord::new(Action::Insert, table, &AuditContext::new(user), "CRM")
            .with_column(column, Some("v".to_string()));
        let write = AuditGateway::default().build(&record).unwrap();
        assert_eq!(store.execute(&write).unwrap(), 1);
    }

    #[test]
    fn test_execute_and_query() {
        let store = SqliteAuditStore::open_in_memory().unwrap();
        write_insert(&store, "user", "login", "1");
        write_insert(&store, "user", "name", "2");
        write_insert(&store, "orders", "total", "1");

        let all = store.query(&AuditQuery::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].table, "orders");
        assert_eq!(all[0].ip, "UNKNOWN");
        assert_eq!(all[2].column.as_deref(), Some("login"));

        let filtered = store
            .query(&AuditQuery {
                table: Some("user".to_string()),
                user_id: Some("2".to_string()),
                ..AuditQuery::default()
            })
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].column.as_deref(), Some("name"));

        let limited = store
            .query(&AuditQuery {
                action: Some(Action::Insert),
                limit: 2,
                ..AuditQuery::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_store_shared_across_threads() {
        let store = std::sync::Arc::new(SqliteAuditStore::open_in_memory().unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || write_insert(&store, "user", "name", &i.to_string()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.query(&AuditQuery::default()).unwrap().len(), 4);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.db");

        let store = SqliteAuditStore::open(&path, "changes").unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.audit_table(), "changes");
    }

    #[test]
    fn test_execute_failure_is_persistence_error() {
        let store = SqliteAuditStore::open_in_memory().unwrap();
        let write = AuditWrite {
            sql: "INSERT INTO missing_table (a) VALUES (:a)".to_string(),
            params: vec![(":a", Some("x".to_string()))],
        };
        assert!(matches!(
            store.execute(&write),
            Err(ChangeLogError::Persistence(_))
        ));
    }
}

//! Persistent query history for sqlruner
//!
//! This module provides SQLite-based storage for every query attempt:
//! - Append-only records, successful or failed
//! - Additive schema migration for stores written by older versions
//! - Fault-tolerant reads (a broken store shows as empty history)
//!
//! The table and column names match the files written by earlier releases,
//! so an existing `history.db` opens in place.

use crate::error::Result;
use crate::types::HistoryId;
use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Storage format of `ExecutedAt`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats older writers may have left in `ExecutedAt`
const LEGACY_TIMESTAMP_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const SELECT_COLUMNS: &str =
    "SELECT Id, ConnectionString, Query, ExecutedAt, ErrorMessage, IsSuccessful, RecordCount
     FROM QueryHistory";

const ORDER_NEWEST_FIRST: &str = "ORDER BY ExecutedAt DESC, Id DESC";

/// A column added after the first release of the history table
struct ColumnMigration {
    column: &'static str,
    definition: &'static str,
}

/// Applied in order, each only if the column is missing
const COLUMN_MIGRATIONS: &[ColumnMigration] = &[
    ColumnMigration {
        column: "ErrorMessage",
        definition: "TEXT",
    },
    ColumnMigration {
        column: "IsSuccessful",
        definition: "INTEGER DEFAULT 1",
    },
    ColumnMigration {
        column: "RecordCount",
        definition: "INTEGER",
    },
];

/// How a query attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded { record_count: Option<i64> },
    Failed { error_message: String },
}

impl Outcome {
    pub fn succeeded(record_count: usize) -> Self {
        Outcome::Succeeded {
            record_count: Some(record_count as i64),
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Outcome::Failed {
            error_message: error_message.into(),
        }
    }
}

/// One stored query attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub connection_string: String,
    pub query: String,
    pub executed_at: NaiveDateTime,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl HistoryRecord {
    pub fn is_successful(&self) -> bool {
        matches!(self.outcome, Outcome::Succeeded { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { error_message } => Some(error_message),
            Outcome::Succeeded { .. } => None,
        }
    }

    pub fn record_count(&self) -> Option<i64> {
        match self.outcome {
            Outcome::Succeeded { record_count } => record_count,
            Outcome::Failed { .. } => None,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_successful() {
            "✓ Success"
        } else {
            "✗ Failed"
        }
    }

    pub fn record_count_display(&self) -> String {
        self.record_count()
            .map_or_else(|| "-".to_string(), |n| n.to_string())
    }
}

/// Append-only history database
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open (creating if needed) the store at `path` and bring its schema up to date
    #[must_use = "History store must be used"]
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;

        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS QueryHistory (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                ConnectionString TEXT NOT NULL,
                Query TEXT NOT NULL,
                ExecutedAt DATETIME NOT NULL,
                ErrorMessage TEXT,
                IsSuccessful INTEGER DEFAULT 1,
                RecordCount INTEGER
            )",
            [],
        )?;

        self.apply_migrations()?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_query_history_executed_at
             ON QueryHistory(ExecutedAt DESC, Id DESC)",
            [],
        )?;

        Ok(())
    }

    fn apply_migrations(&self) -> Result<()> {
        let existing = self.table_columns()?;

        for migration in COLUMN_MIGRATIONS {
            if existing.contains(&migration.column.to_lowercase()) {
                continue;
            }
            self.conn.execute(
                &format!(
                    "ALTER TABLE QueryHistory ADD COLUMN {} {}",
                    migration.column, migration.definition
                ),
                [],
            )?;
            tracing::info!(column = migration.column, "migrated history schema");
        }

        Ok(())
    }

    /// Lowercased column names of the history table
    fn table_columns(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("PRAGMA table_info(QueryHistory)")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .map(|name| name.map(|n| n.to_lowercase()))
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(columns)
    }

    /// Record one query attempt; `ExecutedAt` is the current local time
    pub fn append(&self, connection_string: &str, query: &str, outcome: &Outcome) -> Result<HistoryId> {
        let executed_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let (is_successful, error_message, record_count) = match outcome {
            Outcome::Succeeded { record_count } => (1, None, *record_count),
            Outcome::Failed { error_message } => (0, Some(error_message.as_str()), None),
        };

        self.conn.execute(
            "INSERT INTO QueryHistory
                (ConnectionString, Query, ExecutedAt, ErrorMessage, IsSuccessful, RecordCount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                connection_string,
                query,
                executed_at,
                error_message,
                is_successful,
                record_count
            ],
        )?;

        Ok(HistoryId::new(self.conn.last_insert_rowid()))
    }

    /// Every record, newest first. Storage faults read as an empty history.
    pub fn list_all(&self) -> Vec<HistoryRecord> {
        match self.query_records(&format!("{} {}", SELECT_COLUMNS, ORDER_NEWEST_FIRST)) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("failed to load query history: {}", e);
                Vec::new()
            }
        }
    }

    /// Most recent record, if any
    pub fn latest(&self) -> Option<HistoryRecord> {
        let sql = format!("{} {} LIMIT 1", SELECT_COLUMNS, ORDER_NEWEST_FIRST);
        match self.conn.query_row(&sql, [], record_from_row).optional() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("failed to load latest history entry: {}", e);
                None
            }
        }
    }

    /// Number of records; 0 if the store cannot be read
    pub fn count(&self) -> usize {
        match self
            .conn
            .query_row("SELECT COUNT(*) FROM QueryHistory", [], |row| {
                row.get::<_, i64>(0)
            }) {
            Ok(n) => n as usize,
            Err(e) => {
                tracing::warn!("failed to count query history: {}", e);
                0
            }
        }
    }

    /// Delete every record
    pub fn purge_all(&self) -> Result<usize> {
        let deleted = self.conn.execute("DELETE FROM QueryHistory", [])?;
        tracing::info!(deleted, "purged query history");
        Ok(deleted)
    }

    fn query_records(&self, sql: &str) -> rusqlite::Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryRecord> {
    let executed_at = row
        .get_ref(3)?
        .as_str()
        .ok()
        .and_then(parse_timestamp)
        .unwrap_or_else(|| Local::now().naive_local());

    let error_message: Option<String> = row.get(4)?;
    // Rows written before the outcome columns existed count as successful.
    let is_successful = row.get::<_, Option<i64>>(5)?.is_none_or(|v| v != 0);
    let record_count: Option<i64> = row.get(6)?;

    let outcome = if is_successful {
        Outcome::Succeeded { record_count }
    } else {
        Outcome::Failed {
            error_message: error_message.unwrap_or_default(),
        }
    };

    Ok(HistoryRecord {
        id: row.get(0)?,
        connection_string: row.get(1)?,
        query: row.get(2)?,
        executed_at,
        outcome,
    })
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    LEGACY_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (HistoryStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::open(&dir.path().join("SqlRuner").join("history.db")).unwrap();
        (store, dir)
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let (store, dir) = temp_store();
        assert!(dir.path().join("SqlRuner").join("history.db").exists());
        assert_eq!(store.count(), 0);
        assert!(store.list_all().is_empty());
        assert!(store.latest().is_none());
    }

    #[test]
    fn test_append_then_list_returns_newest_first() {
        let (store, _dir) = temp_store();
        let first = store
            .append("a.db", "SELECT 1", &Outcome::succeeded(1))
            .unwrap();
        let second = store
            .append("b.db", "SELECT 2", &Outcome::succeeded(1))
            .unwrap();
        assert!(second > first);

        let records = store.list_all();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second);
        assert_eq!(records[0].query, "SELECT 2");
        assert_eq!(store.latest().unwrap().id, second);
    }

    #[test]
    fn test_executed_at_orders_before_id() {
        let (store, _dir) = temp_store();
        store
            .conn
            .execute(
                "INSERT INTO QueryHistory (ConnectionString, Query, ExecutedAt) VALUES
                 ('x', 'newer', '2024-05-02 10:00:00'),
                 ('x', 'older', '2024-05-01 10:00:00')",
                [],
            )
            .unwrap();

        let queries: Vec<_> = store.list_all().into_iter().map(|r| r.query).collect();
        assert_eq!(queries, vec!["newer", "older"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let (store, _dir) = temp_store();
        for _ in 0..3 {
            store.append("a.db", "SELECT 1", &Outcome::succeeded(0)).unwrap();
        }
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_zero_row_success() {
        let (store, _dir) = temp_store();
        store.append("a.db", "DELETE FROM t", &Outcome::succeeded(0)).unwrap();

        let record = &store.list_all()[0];
        assert!(record.is_successful());
        assert_eq!(record.record_count(), Some(0));
        assert_eq!(record.error_message(), None);
        assert_eq!(record.status_label(), "✓ Success");
        assert_eq!(record.record_count_display(), "0");
    }

    #[test]
    fn test_failure_record() {
        let (store, _dir) = temp_store();
        store
            .append("a.db", "SELEC 1", &Outcome::failed("near \"SELEC\": syntax error"))
            .unwrap();

        let record = &store.list_all()[0];
        assert!(!record.is_successful());
        assert_eq!(record.record_count(), None);
        assert_eq!(record.error_message(), Some("near \"SELEC\": syntax error"));
        assert_eq!(record.status_label(), "✗ Failed");
        assert_eq!(record.record_count_display(), "-");
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");
        {
            let store = HistoryStore::open(&path).unwrap();
            store.append("a.db", "SELECT 1", &Outcome::succeeded(1)).unwrap();
        }
        HistoryStore::open(&path).unwrap();
        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.table_columns().unwrap().len(), 7);
    }

    #[test]
    fn test_migrates_legacy_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE QueryHistory (
                    Id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ConnectionString TEXT NOT NULL,
                    Query TEXT NOT NULL,
                    ExecutedAt DATETIME NOT NULL
                 );
                 INSERT INTO QueryHistory (ConnectionString, Query, ExecutedAt)
                 VALUES ('old.db', 'SELECT legacy', '2023-01-15 08:30:00');",
            )
            .unwrap();
        }

        let store = HistoryStore::open(&path).unwrap();
        let columns = store.table_columns().unwrap();
        for migration in COLUMN_MIGRATIONS {
            assert!(columns.contains(&migration.column.to_lowercase()));
        }

        let records = store.list_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "SELECT legacy");
        assert!(records[0].is_successful());
        assert_eq!(records[0].record_count(), None);
        assert_eq!(
            records[0].executed_at,
            NaiveDateTime::parse_from_str("2023-01-15 08:30:00", TIMESTAMP_FORMAT).unwrap()
        );
    }

    #[test]
    fn test_migrates_partially_upgraded_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE QueryHistory (
                    Id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ConnectionString TEXT NOT NULL,
                    Query TEXT NOT NULL,
                    ExecutedAt DATETIME NOT NULL,
                    errormessage TEXT
                 );",
            )
            .unwrap();
        }

        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.table_columns().unwrap().len(), 7);
    }

    #[test]
    fn test_purge() {
        let (store, _dir) = temp_store();
        store.append("a.db", "SELECT 1", &Outcome::succeeded(1)).unwrap();
        store.append("a.db", "SELECT 2", &Outcome::failed("x")).unwrap();

        assert_eq!(store.purge_all().unwrap(), 2);
        assert!(store.list_all().is_empty());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_reads_degrade_but_writes_propagate() {
        let (store, _dir) = temp_store();
        store.append("a.db", "SELECT 1", &Outcome::succeeded(1)).unwrap();
        store.conn.execute("DROP TABLE QueryHistory", []).unwrap();

        assert!(store.list_all().is_empty());
        assert_eq!(store.count(), 0);
        assert!(store.latest().is_none());
        assert!(store.append("a.db", "SELECT 1", &Outcome::succeeded(1)).is_err());
        assert!(store.purge_all().is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01 12:00:00").is_some());
        assert!(parse_timestamp("2024-03-01 12:00:00.123").is_some());
        assert!(parse_timestamp("2024-03-01T12:00:00").is_some());
        assert!(parse_timestamp("2024/03/01 12:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_record_serializes_flat() {
        let (store, _dir) = temp_store();
        store.append("a.db", "SELECT 1", &Outcome::succeeded(4)).unwrap();
        let json = serde_json::to_value(&store.list_all()[0]).unwrap();
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["record_count"], 4);
        assert_eq!(json["query"], "SELECT 1");
    }
}

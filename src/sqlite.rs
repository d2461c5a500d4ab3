//! SQLite backend
//!
//! Understands the ADO-style keys users paste from .NET tooling:
//! `Data Source` (a path or `:memory:`), `Version` (must be 3),
//! `FailIfMissing` and `Read Only`.

use crate::backend::{BackendError, QueryBackend};
use crate::classifier::{BackendKind, ConnectionProperties};
use crate::result_set::{CellValue, ColumnDescriptor, ResultSet};
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags, Statement};

const MEMORY: &str = ":memory:";

/// Embedded SQLite driver built on rusqlite
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteBackend;

/// Resolved open parameters of a SQLite connection string
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenOptions {
    path: String,
    fail_if_missing: bool,
    read_only: bool,
}

impl OpenOptions {
    fn parse(connection_string: &str) -> Result<Self, BackendError> {
        let trimmed = connection_string.trim();
        let props = ConnectionProperties::parse(trimmed);

        let path = if props.is_empty() && !trimmed.contains('=') {
            trimmed.to_string()
        } else {
            props
                .get_any(&["data source", "datasource", "filename"])
                .unwrap_or_default()
                .to_string()
        };

        if path.is_empty() {
            return Err(BackendError::new(
                "Data Source cannot be empty. Use :memory: to open an in-memory database",
            ));
        }

        if let Some(version) = props.get("version") {
            if version != "3" {
                return Err(BackendError::new(format!(
                    "Unsupported SQLite version {}; only version 3 is supported",
                    version
                )));
            }
        }

        Ok(Self {
            path,
            fail_if_missing: props.flag("failifmissing").unwrap_or(false),
            read_only: props.flag("read only").unwrap_or(false),
        })
    }

    fn flags(&self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            base | OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.fail_if_missing {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE
        } else {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        }
    }
}

impl SqliteBackend {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, connection_string: &str) -> Result<Connection, BackendError> {
        let options = OpenOptions::parse(connection_string)?;
        tracing::debug!(path = %options.path, "opening SQLite database");

        let conn = if options.path.eq_ignore_ascii_case(MEMORY) {
            Connection::open_in_memory()
        } else {
            Connection::open_with_flags(&options.path, options.flags())
        };

        conn.map_err(|e| sqlite_error(&e))
    }
}

impl QueryBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn ping(&self, connection_string: &str) -> Result<(), BackendError> {
        let conn = self.open(connection_string)?;
        drop(conn);
        Ok(())
    }

    fn execute(&self, connection_string: &str, query: &str) -> Result<ResultSet, BackendError> {
        let conn = self.open(connection_string)?;
        run_batch(&conn, query).map_err(|e| sqlite_error(&e))
    }
}

/// Run every statement in `sql` in order. The first statement that yields
/// columns is materialized; later result sets are stepped through and dropped.
fn run_batch(conn: &Connection, sql: &str) -> rusqlite::Result<ResultSet> {
    let mut result: Option<ResultSet> = None;
    let mut rows_affected: Option<u64> = None;
    let mut batch = Batch::new(conn, sql);

    while let Some(mut stmt) = batch.next()? {
        if stmt.column_count() == 0 {
            rows_affected = Some(stmt.execute([])? as u64);
        } else if result.is_none() {
            result = Some(materialize(&mut stmt)?);
        } else {
            let mut rows = stmt.query([])?;
            while rows.next()?.is_some() {}
        }
    }

    let mut result = result.unwrap_or_default();
    if result.columns.is_empty() {
        result.rows_affected = rows_affected;
    }
    Ok(result)
}

fn materialize(stmt: &mut Statement<'_>) -> rusqlite::Result<ResultSet> {
    let columns: Vec<ColumnDescriptor> = stmt
        .columns()
        .iter()
        .map(|c| ColumnDescriptor::new(c.name(), c.decl_type().map(str::to_string)))
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(cell_value(row.get_ref(idx)?));
        }
        rows.push(values);
    }

    Ok(ResultSet::new(columns, rows))
}

fn cell_value(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::Integer(i),
        ValueRef::Real(r) => CellValue::Real(r),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
    }
}

/// `Error code 1: SQL error or missing database (extended code 1)`
fn result_code(code: &rusqlite::ffi::Error) -> String {
    format!("{} (extended code {})", code, code.extended_code)
}

fn sqlite_error(err: &rusqlite::Error) -> BackendError {
    let backend_err = BackendError::from_error(err);
    match err {
        rusqlite::Error::SqliteFailure(code, _) => backend_err.with_trace(result_code(code)),
        // Prepare-time failures carry the byte offset of the offending token
        rusqlite::Error::SqlInputError { error, offset, .. } if *offset >= 0 => {
            backend_err.with_trace(format!("{} at offset {}", result_code(error), offset))
        }
        rusqlite::Error::SqlInputError { error, .. } => backend_err.with_trace(result_code(error)),
        _ => backend_err,
    }
}

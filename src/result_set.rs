//! Backend-neutral tabular results

use serde::Serialize;
use std::fmt;

/// Name and inferred type of one result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared or wire type as reported by the backend, if any
    pub type_name: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_name,
        }
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// Render for display, using `null` for SQL NULL
    pub fn display_with<'a>(&'a self, null: &'a str) -> CellDisplay<'a> {
        CellDisplay { value: self, null }
    }
}

/// Display adapter returned by [`CellValue::display_with`]
pub struct CellDisplay<'a> {
    value: &'a CellValue,
    null: &'a str,
}

impl fmt::Display for CellDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            CellValue::Null => f.write_str(self.null),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => write!(f, "{}", r),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Blob(bytes) => {
                f.write_str("0x")?;
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// Materialized outcome of a successful statement.
///
/// Rows are aligned with `columns`. Statements that produce no columns (DDL,
/// DML) come back with empty `columns` and `rows` and, where the backend
/// reports one, a `rows_affected` count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<CellValue>>,
    pub rows_affected: Option<u64>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: None,
        }
    }

    /// Number of rows returned; this is what history records
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

//! Connection string normalization and backend classification
//!
//! Everything here is pure: the same raw string always yields the same
//! canonical string and backend. Nothing is persisted, so history entries are
//! re-classified on every replay.

use serde::{Deserialize, Serialize};
use std::fmt;

const SERVER_KEYS: &[&str] = &["server", "initial catalog", "integrated security"];
const SQLITE_FILE_MARKERS: &[&str] = &[".db", ".sqlite", ".sqlite3"];

/// One of the two supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    Sqlite,
    SqlServer,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "SQLite"),
            BackendKind::SqlServer => write!(f, "SQL Server"),
        }
    }
}

/// Outcome of classifying a connection string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Known(BackendKind),
    /// No distinguishing keys; the executor tries each backend in turn
    Ambiguous,
}

/// A normalized connection string together with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedConnection {
    pub connection_string: String,
    pub classification: Classification,
}

/// Wrap a bare file path in a canonical SQLite connection string
pub fn sqlite_connection_string(path: &str) -> String {
    format!("Data Source={};Version=3;", path)
}

/// Collapse doubled backslashes and turn bare database file paths into a
/// SQLite connection string.
pub fn normalize(raw: &str) -> String {
    let collapsed = raw.trim().replace("\\\\", "\\");
    let lower = collapsed.to_lowercase();

    if !collapsed.contains('=') && (lower.contains(".db") || lower.contains(".sqlite")) {
        return sqlite_connection_string(&collapsed);
    }

    collapsed
}

/// Normalize `raw` and decide which backend it addresses.
pub fn classify(raw: &str) -> NormalizedConnection {
    let mut connection_string = normalize(raw);
    let lower = connection_string.to_lowercase();
    let properties = ConnectionProperties::parse(&connection_string);

    let classification = if SERVER_KEYS.iter().any(|key| properties.contains(key)) {
        Classification::Known(BackendKind::SqlServer)
    } else if properties.contains("data source") && properties.get("version") == Some("3") {
        Classification::Known(BackendKind::Sqlite)
    } else if SQLITE_FILE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
    {
        if !connection_string.contains('=') {
            connection_string = sqlite_connection_string(&connection_string);
        }
        Classification::Known(BackendKind::Sqlite)
    } else {
        Classification::Ambiguous
    };

    tracing::debug!(?classification, "classified connection string");

    NormalizedConnection {
        connection_string,
        classification,
    }
}

/// `key=value;key=value` pairs of an ADO-style connection string.
///
/// Keys are lowercased and trimmed; values are trimmed and stripped of one
/// level of surrounding quotes. Later duplicates win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionProperties {
    pairs: Vec<(String, String)>,
}

impl ConnectionProperties {
    pub fn parse(connection_string: &str) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();

        for part in connection_string.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            let value = unquote(value.trim()).to_string();

            if let Some(existing) = pairs.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = value;
            } else {
                pairs.push((key, value));
            }
        }

        Self { pairs }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First key present among `keys`
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Boolean value of `key`; `None` when absent or not a recognizable flag
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)?.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

//! Common backend trait for query execution
//!
//! This module defines the QueryBackend trait that the SQLite and SQL Server
//! drivers implement, so the executor can apply its classification and
//! fallback policy without knowing how either engine connects.

use crate::classifier::BackendKind;
use crate::result_set::ResultSet;
use std::error::Error as StdError;
use thiserror::Error;

/// Error raised by a backend driver, flattened to text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    pub cause: Option<String>,
    pub trace: Option<String>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            trace: None,
        }
    }

    /// Capture `err` together with the messages of its source chain
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(inner) = source {
            causes.push(inner.to_string());
            source = inner.source();
        }
        Self {
            message: err.to_string(),
            cause: (!causes.is_empty()).then(|| causes.join("\n")),
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// A database engine able to open a connection and run one statement.
///
/// Every call opens a fresh connection and releases it before returning,
/// on success and on error alike.
pub trait QueryBackend {
    fn kind(&self) -> BackendKind;

    /// Open and close a connection without running anything
    fn ping(&self, connection_string: &str) -> Result<(), BackendError>;

    /// Run `query` verbatim and materialize its first result
    #[must_use = "Query results should be used"]
    fn execute(&self, connection_string: &str, query: &str) -> Result<ResultSet, BackendError>;
}

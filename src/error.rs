//! Error handling for sqlruner
//!
//! Two kinds of failure live here. [`Error`] covers faults of the tool itself
//! (history storage, configuration, arguments). [`ExecutionFailure`] is the
//! outcome of a statement or connection that a backend rejected; it is data to
//! show the user and to record in history, not a crate fault.

use crate::classifier::BackendKind;
use crate::guidance::Guidance;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sqlruner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sqlruner operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// History store operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Per-user data or config directory could not be determined
    #[error("Application data directory not found")]
    DataDirectoryNotFound,

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid command line arguments
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// No history record with the given id
    #[error("History entry {id} not found")]
    HistoryNotFound { id: i64 },

    /// Configuration validation failed
    #[error("Configuration validation failed: {field} - {reason}")]
    ConfigValidation { field: String, reason: String },

    /// Generic error with custom message
    #[error("{message}")]
    Custom { message: String },
}

impl Error {
    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom {
            message: message.into(),
        }
    }

    /// Create an invalid arguments error
    pub fn invalid_arguments<S: Into<String>>(message: S) -> Self {
        Error::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a config validation error
    pub fn config_validation<S: Into<String>>(field: S, reason: S) -> Self {
        Error::ConfigValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Get the error category for logging purposes
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Database(_) => "storage",
            Error::DataDirectoryNotFound => "system",
            Error::ConfigNotFound { .. } | Error::ConfigValidation { .. } => "config",
            Error::InvalidArguments { .. } => "arguments",
            Error::HistoryNotFound { .. } => "history",
            Error::Custom { .. } => "custom",
        }
    }
}

const SEPARATOR: &str = "═══════════════════════════════════";

/// A backend refused the connection or the statement.
///
/// `backend` is `None` when an ambiguous connection string failed against
/// both backends; `message` then lists both underlying errors.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ExecutionFailure {
    pub backend: Option<BackendKind>,
    pub message: String,
    pub cause: Option<String>,
    pub trace: Option<String>,
    pub connection_string: String,
    pub guidance: Option<Guidance>,
}

impl ExecutionFailure {
    /// Build a failure and attach whatever guidance matches the message
    pub fn new(
        backend: Option<BackendKind>,
        message: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let guidance = Guidance::detect(&message);
        Self {
            backend,
            message,
            cause: None,
            trace: None,
            connection_string: connection_string.into(),
            guidance,
        }
    }

    pub fn with_cause(mut self, cause: Option<String>) -> Self {
        self.cause = cause.filter(|c| !c.is_empty() && *c != self.message);
        self
    }

    pub fn with_trace(mut self, trace: Option<String>) -> Self {
        self.trace = trace.filter(|t| !t.is_empty());
        self
    }

    /// Render the full diagnostic payload shown to the user and stored in history
    pub fn report(&self) -> String {
        let heading = match self.backend {
            Some(kind) => format!("Query failed on {}", kind),
            None => "Query failed".to_string(),
        };
        let mut out = format!("{}:\n{}", heading, self.message);

        out.push_str(&format!(
            "\n\nConnection string used:\n{}",
            self.connection_string
        ));

        if let Some(cause) = &self.cause {
            out.push_str(&format!("\n\nDetails:\n{}", cause));
        }

        if let Some(trace) = &self.trace {
            out.push_str(&format!("\n\nDiagnostics:\n{}", trace));
        }

        if let Some(guidance) = &self.guidance {
            out.push_str(&format!("\n\n{}\n{}", SEPARATOR, guidance.tips()));
        }

        out
    }
}

//! Prelude module for sqlruner
//!
//! This module re-exports commonly used types and traits to reduce
//! boilerplate imports throughout the codebase.
//!
//! # Usage
//!
//! ```rust
//! use sqlruner::prelude::*;
//! ```

pub use crate::backend::{BackendError, QueryBackend};
pub use crate::classifier::{BackendKind, Classification};
pub use crate::config::Config;
pub use crate::error::{Error, ExecutionFailure, Result};
pub use crate::history_store::{HistoryRecord, Outcome};
pub use crate::result_set::{CellValue, ResultSet};
pub use crate::runner::SqlRunner;
pub use crate::types::HistoryId;

// Re-export commonly used external types
pub use chrono::{Local, NaiveDateTime};

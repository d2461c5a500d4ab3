//! sqlruner - Run SQL against SQLite or SQL Server with a persistent query history
//!
//! This library provides functionality for:
//! - Classifying a connection string as SQLite or SQL Server
//! - Executing a statement and materializing its first result set
//! - Recording every attempt, successful or failed, in a SQLite history store
//! - Paging through history and replaying stored queries
//!
//! # Examples
//!
//! ```rust,no_run
//! use sqlruner::{Config, SqlRunner};
//!
//! let mut runner = SqlRunner::new(Config::default())?;
//! let run = runner.run_query("inventory.db", "SELECT name FROM sqlite_master");
//! println!("recorded: {}", run.history_saved);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::PathBuf;

pub mod backend;
pub mod browse_tui;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod guidance;
pub mod history_store;
pub mod pager;
pub mod prelude;
pub mod result_set;
pub mod runner;
pub mod sql_server;
pub mod sqlite;
pub mod types;

pub use classifier::BackendKind;
pub use config::Config;
pub use error::{Error, ExecutionFailure, Result};
pub use executor::Executor;
pub use history_store::{HistoryRecord, HistoryStore, Outcome};
pub use pager::{HistoryPage, HistoryPager, Selection};
pub use result_set::{CellValue, ColumnDescriptor, ResultSet};
pub use runner::{QueryRun, SqlRunner};

/// Directory under the per-user data and config roots
pub const APP_DIR: &str = "SqlRuner";

/// The default history database file name
pub const HISTORY_FILE: &str = "history.db";

/// Get the default history database path
pub fn default_history_path() -> Result<PathBuf> {
    let data = dirs::data_dir().ok_or(Error::DataDirectoryNotFound)?;
    Ok(data.join(APP_DIR).join(HISTORY_FILE))
}

//! Command handler implementations for sqlruner CLI
//!
//! This module organizes command handlers into logical groups:
//! - `query`: Commands that execute SQL (test, run, replay)
//! - `history`: History commands (history, show, purge, browse)
//! - `config`: Configuration handler
//! - `output`: Result and history rendering shared by the handlers

mod config;
mod history;
mod output;
mod query;

pub use config::*;
pub use history::*;
pub use query::*;

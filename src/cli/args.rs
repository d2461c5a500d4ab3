//! Command-line argument structures for sqlruner

use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct TestArgs {
    /// Connection string (defaults to the last one in history)
    #[arg(value_name = "CONNECTION")]
    pub connection: Option<String>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Connection string (defaults to the last one in history)
    #[arg(short = 'C', long)]
    pub connection: Option<String>,

    /// SQL text to execute
    #[arg(value_name = "QUERY", conflicts_with = "file")]
    pub query: Option<String>,

    /// Read the SQL text from a file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Page number (clamped to the available pages)
    #[arg(short = 'p', long, default_value = "1")]
    pub page: usize,

    /// Print the page as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// History entry id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Print the entry as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// History entry id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PurgeArgs {
    /// Delete without prompting
    #[arg(short = 'F', long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the configuration file path only
    #[arg(long)]
    pub path: bool,

    /// Write a configuration file with defaults
    #[arg(long)]
    pub init: bool,
}

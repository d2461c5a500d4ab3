//! sqlruner - Run SQL against SQLite or SQL Server and keep a browsable history
//!
//! This is the main entry point for the sqlruner command-line application.
//! It initializes logging and handles errors gracefully.

use sqlruner::cli;
use sqlruner::config::Config;
use sqlruner::error::Result;
use std::process;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    // RUST_LOG wins; otherwise the configured level, otherwise "warn"
    let configured = Config::load()
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&configured))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        tracing::debug!(category = e.category(), "command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    cli::run()
}

//! Command-line interface module for sqlruner
//!
//! This module is organized into submodules:
//! - `args`: Command-line argument structures
//! - `handlers`: Command handler implementations

mod args;
mod handlers;

pub use args::*;
use handlers::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::runner::SqlRunner;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sqlruner - Run SQL against SQLite or SQL Server with a browsable history
#[derive(Parser)]
#[command(name = "sqlruner")]
#[command(about = "Run SQL against SQLite or SQL Server and keep a history of every execution")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that a connection string opens
    Test(TestArgs),
    /// Execute a query and record it in history
    Run(RunArgs),
    /// Show a page of query history
    History(HistoryArgs),
    /// Show one history entry in full
    Show(ShowArgs),
    /// Run a stored query again
    Replay(ReplayArgs),
    /// Delete all query history
    Purge(PurgeArgs),
    /// Browse history interactively
    Browse,
    /// Show configuration
    Config(ConfigArgs),
}

/// Main CLI application
pub struct CliApp {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    runner: Option<SqlRunner>,
    pub verbose: bool,
    pub quiet: bool,
}

impl CliApp {
    /// Create a new CLI application
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = if let Some(config_path) = &cli.config {
            // An explicit path must exist, except when `config --init` is about to write it
            if !config_path.exists() && !matches!(cli.command, Commands::Config(_)) {
                return Err(Error::ConfigNotFound {
                    path: config_path.clone(),
                });
            }
            Config::load_from_path(config_path)?
        } else {
            Config::load().unwrap_or_else(|e| {
                tracing::warn!("using default configuration: {}", e);
                Config::default()
            })
        };

        Ok(Self {
            config,
            config_path: cli.config.clone(),
            runner: None,
            verbose: cli.verbose,
            quiet: cli.quiet,
        })
    }

    /// The session runner, opening the history store on first use
    pub fn runner(&mut self) -> Result<&mut SqlRunner> {
        let runner = match self.runner.take() {
            Some(runner) => runner,
            None => SqlRunner::new(self.config.clone())?,
        };
        Ok(self.runner.insert(runner))
    }

    /// Run the CLI application
    pub fn run(&mut self, command: &Commands) -> Result<()> {
        self.verbose_println(&format!(
            "Using history database {}",
            self.config.history_file.display()
        ));

        match command {
            Commands::Test(args) => handle_test(self, args),
            Commands::Run(args) => handle_run(self, args),
            Commands::History(args) => handle_history(self, args),
            Commands::Show(args) => handle_show(self, args),
            Commands::Replay(args) => handle_replay(self, args),
            Commands::Purge(args) => handle_purge(self, args),
            Commands::Browse => handle_browse(self),
            Commands::Config(args) => handle_config(self, args),
        }
    }

    pub fn verbose_println(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("[verbose] {}", message);
        }
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut app = CliApp::new(&cli)?;
    app.run(&cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_connection() {
        let cli = Cli::parse_from(["sqlruner", "run", "-C", "app.db", "SELECT 1", "--json"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.connection.as_deref(), Some("app.db"));
                assert_eq!(args.query.as_deref(), Some("SELECT 1"));
                assert!(args.json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_query_and_file_conflict() {
        let parsed = Cli::try_parse_from(["sqlruner", "run", "SELECT 1", "--file", "q.sql"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_history_page_defaults_to_one() {
        let cli = Cli::parse_from(["sqlruner", "history"]);
        match cli.command {
            Commands::History(args) => assert_eq!(args.page, 1),
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_config_commands_leave_history_untouched() {
        let dir = TempDir::new().unwrap();
        let history = dir.path().join("history.db");
        let config_path = dir.path().join("config.json");
        Config {
            history_file: history.clone(),
            ..Config::default()
        }
        .save_to_path(&config_path)
        .unwrap();

        let config_arg = config_path.to_str().unwrap();
        for extra in [&["config", "--path"][..], &["config"][..]] {
            let mut argv = vec!["sqlruner", "--quiet", "--config", config_arg];
            argv.extend_from_slice(extra);
            let cli = Cli::parse_from(argv);
            let mut app = CliApp::new(&cli).unwrap();
            app.run(&cli.command).unwrap();
        }
        assert!(!history.exists());

        let cli = Cli::parse_from(["sqlruner", "--config", config_arg, "history"]);
        let mut app = CliApp::new(&cli).unwrap();
        app.run(&cli.command).unwrap();
        assert!(history.exists());
    }
}

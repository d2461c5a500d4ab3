//! Configuration handler for sqlruner CLI

use crate::cli::CliApp;
use crate::cli::args::*;
use crate::config::Config;
use crate::error::Result;

pub fn handle_config(app: &mut CliApp, args: &ConfigArgs) -> Result<()> {
    let config_path = match &app.config_path {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };

    if args.path {
        println!("{}", config_path.display());
    } else if args.init {
        match &app.config_path {
            Some(path) => Config::default().save_to_path(path)?,
            None => Config::default().save()?,
        }
        if !app.quiet {
            println!("Configuration initialized at {}", config_path.display());
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&app.config)?);
    }

    Ok(())
}

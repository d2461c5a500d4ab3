//! Query execution handlers for sqlruner CLI

use super::output::format_result;
use crate::cli::CliApp;
use crate::cli::args::*;
use crate::error::{Error, Result};
use crate::runner::QueryRun;
use crate::types::HistoryId;
use std::fs;

/// Explicit connection string, or the newest one in history
fn resolve_connection(app: &mut CliApp, explicit: Option<&str>) -> Result<String> {
    if let Some(cs) = explicit {
        return Ok(cs.to_string());
    }
    let last = app.runner()?.last_connection_string().ok_or_else(|| {
        Error::invalid_arguments("no connection string given and query history is empty")
    })?;
    app.verbose_println(&format!("Using last connection string: {}", last));
    Ok(last)
}

fn resolve_query(args: &RunArgs) -> Result<String> {
    let query = match (&args.query, &args.file) {
        (Some(q), _) => q.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Err(Error::invalid_arguments("provide a QUERY or --file")),
    };
    if query.trim().is_empty() {
        return Err(Error::invalid_arguments("query text is empty"));
    }
    Ok(query)
}

pub fn handle_test(app: &mut CliApp, args: &TestArgs) -> Result<()> {
    let cs = resolve_connection(app, args.connection.as_deref())?;

    let tested = app.runner()?.test_connection(&cs);
    match tested {
        Ok(kind) => {
            if !app.quiet {
                println!("Connection succeeded ({})", kind);
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", failure.report());
            Err(Error::custom("connection test failed"))
        }
    }
}

pub fn handle_run(app: &mut CliApp, args: &RunArgs) -> Result<()> {
    let cs = resolve_connection(app, args.connection.as_deref())?;
    let query = resolve_query(args)?;

    app.verbose_println(&format!("Executing against: {}", cs));
    let run = app.runner()?.run_query(&cs, &query);
    report_run(app, run, args.json)
}

pub fn handle_replay(app: &mut CliApp, args: &ReplayArgs) -> Result<()> {
    let run = app.runner()?.replay(HistoryId::new(args.id))?;
    report_run(app, run, args.json)
}

/// Print the outcome of a run; a failed query becomes a non-zero exit
pub(crate) fn report_run(app: &CliApp, run: QueryRun, json: bool) -> Result<()> {
    if !run.history_saved {
        eprintln!("Warning: history not saved");
    }

    if json {
        let value = match &run.result {
            Ok(rs) => serde_json::json!({
                "success": true,
                "result": rs,
                "history_saved": run.history_saved,
            }),
            Err(failure) => serde_json::json!({
                "success": false,
                "backend": failure.backend,
                "error": failure.report(),
                "guidance": failure.guidance,
                "history_saved": run.history_saved,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return match run.result {
            Ok(_) => Ok(()),
            Err(_) => Err(Error::custom("query failed")),
        };
    }

    match run.result {
        Ok(rs) => {
            if !app.quiet {
                println!("{}", format_result(&rs, &app.config.display));
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", failure.report());
            Err(Error::custom("query failed"))
        }
    }
}

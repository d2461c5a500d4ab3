//! History handlers for sqlruner CLI

use super::output::{confirm, format_history_page};
use super::query::report_run;
use crate::browse_tui;
use crate::cli::CliApp;
use crate::cli::args::*;
use crate::error::Result;
use crate::types::HistoryId;

pub fn handle_history(app: &mut CliApp, args: &HistoryArgs) -> Result<()> {
    let page = app.runner()?.history_page(args.page);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("{}", format_history_page(&page));
    }

    Ok(())
}

pub fn handle_show(app: &mut CliApp, args: &ShowArgs) -> Result<()> {
    let record = app.runner()?.find(HistoryId::new(args.id))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("ID:         {}", record.id);
    println!("Executed:   {}", record.executed_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Status:     {}", record.status_label());
    println!("Rows:       {}", record.record_count_display());
    println!("Connection: {}", record.connection_string);
    println!("\n{}", record.query);

    if let Some(error) = record.error_message() {
        println!("\nError details:\n{}", error);
    }

    Ok(())
}

pub fn handle_purge(app: &mut CliApp, args: &PurgeArgs) -> Result<()> {
    if !args.force && !confirm("Are you sure you want to delete all query history?")? {
        println!("Aborted");
        return Ok(());
    }

    let deleted = app.runner()?.purge_history()?;

    if !app.quiet {
        println!("Deleted {} history entries", deleted);
    }

    Ok(())
}

pub fn handle_browse(app: &mut CliApp) -> Result<()> {
    let pager = app.runner()?.pager().clone();
    if pager.total_count() == 0 {
        println!("No query history to browse");
        return Ok(());
    }

    let Some(selection) = browse_tui::run_browser(pager)? else {
        return Ok(());
    };

    println!("{}", selection.summary);
    println!("Connection: {}", selection.connection_string);
    println!("\n{}", selection.query);
    if let Some(error) = &selection.error_message {
        println!("\nError details:\n{}", error);
    }

    if confirm("\nRun this query again?")? {
        let run = app.runner()?.replay(selection.id)?;
        return report_run(app, run, false);
    }

    Ok(())
}

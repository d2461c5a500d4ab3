//! Plain-text rendering of result sets and history pages

use crate::config::DisplayConfig;
use crate::error::Result;
use crate::history_store::HistoryRecord;
use crate::pager::HistoryPage;
use crate::result_set::ResultSet;
use std::io::{self, Write};

const ELLIPSIS: char = '…';
const HISTORY_QUERY_WIDTH: usize = 60;

/// Cut `text` to `max` characters, marking the cut with an ellipsis
pub(crate) fn truncate(text: &str, max: usize) -> String {
    // Multi-line cells render on one line
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut out: String = flat.chars().take(max.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        out.push('\n');
        out.push_str(&line(row));
    }
    out
}

/// Render a result set as an aligned text table with a row-count footer
pub(crate) fn format_result(rs: &ResultSet, display: &DisplayConfig) -> String {
    if rs.columns.is_empty() {
        return match rs.rows_affected {
            Some(n) => format!("{} row(s) affected", n),
            None => "Statement executed".to_string(),
        };
    }

    let headers: Vec<String> = rs
        .column_names()
        .map(|n| truncate(n, display.max_column_width))
        .collect();
    let rows: Vec<Vec<String>> = rs
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    truncate(
                        &cell.display_with(&display.null_placeholder).to_string(),
                        display.max_column_width,
                    )
                })
                .collect()
        })
        .collect();

    format!("{}\n({} rows)", render_grid(&headers, &rows), rs.row_count())
}

/// Render one page of history with a page footer
pub(crate) fn format_history_page(page: &HistoryPage) -> String {
    if page.items.is_empty() {
        return "No query history".to_string();
    }

    let headers: Vec<String> = ["ID", "Executed", "Status", "Rows", "Query"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows: Vec<Vec<String>> = page.items.iter().map(history_row).collect();

    format!(
        "{}\n\nPage {} of {} ({} entries)",
        render_grid(&headers, &rows),
        page.current_page,
        page.total_pages,
        page.total_count
    )
}

fn history_row(record: &HistoryRecord) -> Vec<String> {
    vec![
        record.id.to_string(),
        record.executed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        record.status_label().to_string(),
        record.record_count_display(),
        truncate(&record.query, HISTORY_QUERY_WIDTH),
    ]
}

/// Ask a yes/no question on stdin; anything but "y" is a no
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

//! Interactive history browser
//!
//! A full-screen pager over query history:
//! - Page through history with Home/←/→/End
//! - Move the selection with ↑/↓
//! - Toggle between the query and its stored error with `e`
//! - Pick a record for replay with Enter

use crate::error::Result;
use crate::history_store::HistoryRecord;
use crate::pager::{HistoryPager, Selection};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io;

const HELP_TEXT: &[&str] = &[
    "Keybindings:",
    "",
    "  Home/←/→/End - First, previous, next, last page",
    "  ↑/↓          - Move selection",
    "  e            - Toggle error details",
    "  Enter        - Load the selected query and exit",
    "  ?/F1         - Toggle help",
    "  q/Esc        - Quit",
];

/// History browser state
pub struct BrowseUI {
    pager: HistoryPager,
    list_state: ListState,
    show_error: bool,
    show_help: bool,
    running: bool,
    chosen: Option<Selection>,
}

impl BrowseUI {
    pub fn new(pager: HistoryPager) -> Self {
        let mut ui = Self {
            pager,
            list_state: ListState::default(),
            show_error: false,
            show_help: false,
            running: true,
            chosen: None,
        };
        ui.reset_selection();
        ui
    }

    fn reset_selection(&mut self) {
        let first = (!self.pager.page_items().is_empty()).then_some(0);
        self.list_state.select(first);
    }

    fn selected_index(&self) -> Option<usize> {
        self.list_state.selected()
    }

    fn selected_record(&self) -> Option<&HistoryRecord> {
        self.selected_index()
            .and_then(|i| self.pager.page_items().get(i))
    }

    fn select_previous(&mut self) {
        if let Some(i) = self.selected_index() {
            self.list_state.select(Some(i.saturating_sub(1)));
        }
    }

    fn select_next(&mut self) {
        let len = self.pager.page_items().len();
        if let Some(i) = self.selected_index() {
            self.list_state.select(Some((i + 1).min(len.saturating_sub(1))));
        }
    }

    fn page_moved(&mut self, changed: bool) {
        if changed {
            self.reset_selection();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = !self.show_help,
            KeyCode::Char('e') => self.show_error = !self.show_error,
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Home => {
                let changed = self.pager.first();
                self.page_moved(changed);
            }
            KeyCode::Left | KeyCode::PageUp => {
                let changed = self.pager.previous();
                self.page_moved(changed);
            }
            KeyCode::Right | KeyCode::PageDown => {
                let changed = self.pager.next();
                self.page_moved(changed);
            }
            KeyCode::End => {
                let changed = self.pager.last();
                self.page_moved(changed);
            }
            KeyCode::Enter => {
                if let Some(i) = self.selected_index() {
                    self.chosen = self.pager.select(i);
                    self.running = false;
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(9),
            ])
            .split(frame.area());

        let header = Paragraph::new(format!(
            "Query History - Page {} of {} ({} entries)",
            self.pager.current_page(),
            self.pager.total_pages(),
            self.pager.total_count()
        ))
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan));
        frame.render_widget(header, chunks[0]);

        let items: Vec<ListItem> = self
            .pager
            .page_items()
            .iter()
            .map(|record| {
                let status_style = if record.is_successful() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                };
                let first_line = record.query.lines().next().unwrap_or_default();

                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", record.executed_at.format("%Y-%m-%d %H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(format!("{:<10} ", record.status_label()), status_style),
                    Span::styled(
                        format!("{:>6} ", record.record_count_display()),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::raw(first_line.to_string()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Queries"))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);

        let (title, body, color) = if self.show_help {
            ("Help", HELP_TEXT.join("\n"), Color::Yellow)
        } else if let Some(record) = self.selected_record() {
            if self.show_error {
                let error = record
                    .error_message()
                    .unwrap_or("No error recorded for this query");
                ("Error", error.to_string(), Color::Red)
            } else {
                let details = format!(
                    "Connection: {}\nExecuted: {}\nStatus: {}  Rows: {}\n\n{}",
                    record.connection_string,
                    record.executed_at.format("%Y-%m-%d %H:%M:%S"),
                    record.status_label(),
                    record.record_count_display(),
                    record.query
                );
                ("Details", details, Color::Green)
            }
        } else {
            ("Details", "No query history yet".to_string(), Color::DarkGray)
        };

        let panel = Paragraph::new(body)
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: false });
        frame.render_widget(panel, chunks[2]);
    }
}

/// Run the browser and return the record picked with Enter, if any
pub fn run_browser(pager: HistoryPager) -> Result<Option<Selection>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut ui = BrowseUI::new(pager);

    let result = (|| -> Result<()> {
        while ui.running {
            terminal.draw(|f| ui.render(f))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        ui.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    })();

    // Always restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    Ok(ui.chosen)
}

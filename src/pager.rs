//! Paged view over query history
//!
//! The pager holds a snapshot of every record, newest first, and tracks the
//! page the user is looking at. It never touches the store; callers hand it a
//! fresh list with [`HistoryPager::replace`] after each append or purge.

use crate::history_store::HistoryRecord;
use crate::types::HistoryId;
use serde::Serialize;

/// Page size used when the configuration does not set one
pub const DEFAULT_PAGE_SIZE: usize = 10;

const SUMMARY_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Immutable copy of one page of history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryRecord>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

/// A record picked for replay into the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub id: HistoryId,
    pub query: String,
    pub connection_string: String,
    pub error_message: Option<String>,
    pub summary: String,
}

impl Selection {
    fn from_record(record: &HistoryRecord) -> Self {
        let when = record.executed_at.format(SUMMARY_TIME_FORMAT);
        let summary = match record.record_count() {
            _ if !record.is_successful() => format!(
                "Query loaded - failed - {} - see the error details below",
                when
            ),
            Some(n) => format!("Query loaded - succeeded - {} rows - {}", n, when),
            None => format!("Query loaded - succeeded - {}", when),
        };

        Self {
            id: record.id,
            query: record.query.clone(),
            connection_string: record.connection_string.clone(),
            error_message: record.error_message().map(str::to_string),
            summary,
        }
    }
}

/// In-memory pagination state
#[derive(Debug, Clone)]
pub struct HistoryPager {
    records: Vec<HistoryRecord>,
    page_size: usize,
    current_page: usize,
}

impl HistoryPager {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    /// Swap in a fresh record list and return to the first page
    pub fn replace(&mut self, records: Vec<HistoryRecord>) {
        self.records = records;
        self.current_page = 1;
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn total_pages(&self) -> usize {
        self.records.len().div_ceil(self.page_size).max(1)
    }

    /// Records on the current page
    pub fn page_items(&self) -> &[HistoryRecord] {
        let start = (self.current_page - 1) * self.page_size;
        if start >= self.records.len() {
            return &[];
        }
        let end = (start + self.page_size).min(self.records.len());
        &self.records[start..end]
    }

    pub fn first(&mut self) -> bool {
        self.go_to(1)
    }

    pub fn previous(&mut self) -> bool {
        if self.current_page <= 1 {
            return false;
        }
        self.go_to(self.current_page - 1)
    }

    pub fn next(&mut self) -> bool {
        if self.current_page >= self.total_pages() {
            return false;
        }
        self.go_to(self.current_page + 1)
    }

    pub fn last(&mut self) -> bool {
        self.go_to(self.total_pages())
    }

    /// Jump to `page`, clamped to the valid range. Returns whether the page changed.
    pub fn go_to(&mut self, page: usize) -> bool {
        let page = page.clamp(1, self.total_pages());
        let changed = page != self.current_page;
        self.current_page = page;
        changed
    }

    pub fn snapshot(&self) -> HistoryPage {
        HistoryPage {
            items: self.page_items().to_vec(),
            current_page: self.current_page,
            total_pages: self.total_pages(),
            total_count: self.total_count(),
        }
    }

    /// Pick the record at `index` on the current page
    pub fn select(&self, index: usize) -> Option<Selection> {
        self.page_items().get(index).map(Selection::from_record)
    }

    /// Look a record up by id, regardless of page
    pub fn find(&self, id: HistoryId) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

impl Default for HistoryPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history_store::Outcome;
    use chrono::NaiveDate;

    fn record(id: i64, outcome: Outcome) -> HistoryRecord {
        HistoryRecord {
            id: HistoryId::new(id),
            connection_string: "Data Source=app.db;Version=3;".to_string(),
            query: format!("SELECT {}", id),
            executed_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .and_then(|d| d.and_hms_opt(9, 5, 30))
                .unwrap(),
            outcome,
        }
    }

    fn records(n: i64) -> Vec<HistoryRecord> {
        (1..=n)
            .rev()
            .map(|id| record(id, Outcome::succeeded(1)))
            .collect()
    }

    fn pager_with(n: i64) -> HistoryPager {
        let mut pager = HistoryPager::new(10);
        pager.replace(records(n));
        pager
    }

    #[test]
    fn test_empty_history_has_one_page() {
        let pager = HistoryPager::default();
        assert_eq!(pager.total_pages(), 1);
        assert_eq!(pager.current_page(), 1);
        assert!(pager.page_items().is_empty());
        assert!(pager.select(0).is_none());
    }

    #[test]
    fn test_twenty_three_records_in_pages_of_ten() {
        let mut pager = pager_with(23);
        assert_eq!(pager.total_pages(), 3);
        assert_eq!(pager.page_items().len(), 10);
        assert_eq!(pager.page_items()[0].id, HistoryId::new(23));

        assert!(!pager.previous());
        assert_eq!(pager.current_page(), 1);

        assert!(pager.last());
        assert_eq!(pager.current_page(), 3);
        assert_eq!(pager.page_items().len(), 3);
        assert!(!pager.next());
        assert_eq!(pager.current_page(), 3);
    }

    #[test]
    fn test_navigation() {
        let mut pager = pager_with(23);
        assert!(pager.next());
        assert_eq!(pager.current_page(), 2);
        assert!(pager.previous());
        assert!(!pager.first());
        assert!(pager.last());
        assert!(!pager.last());
        assert!(pager.first());
    }

    #[test]
    fn test_go_to_clamps() {
        let mut pager = pager_with(23);
        assert!(pager.go_to(99));
        assert_eq!(pager.current_page(), 3);
        assert!(pager.go_to(0));
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_replace_resets_to_first_page() {
        let mut pager = pager_with(23);
        pager.last();
        pager.replace(records(5));
        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.total_pages(), 1);
    }

    #[test]
    fn test_zero_page_size_is_coerced() {
        let mut pager = HistoryPager::new(0);
        pager.replace(records(3));
        assert_eq!(pager.page_size(), 1);
        assert_eq!(pager.total_pages(), 3);
    }

    #[test]
    fn test_snapshot() {
        let mut pager = pager_with(12);
        pager.next();
        let page = pager.snapshot();
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.total_count, 12);
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn test_select_success_summary() {
        let mut pager = HistoryPager::new(10);
        pager.replace(vec![record(1, Outcome::succeeded(42))]);

        let selection = pager.select(0).unwrap();
        assert_eq!(selection.query, "SELECT 1");
        assert_eq!(selection.error_message, None);
        assert_eq!(
            selection.summary,
            "Query loaded - succeeded - 42 rows - 2024/06/01 09:05:30"
        );
    }

    #[test]
    fn test_select_failure_surfaces_error() {
        let mut pager = HistoryPager::new(10);
        pager.replace(vec![record(1, Outcome::failed("no such table: t"))]);

        let selection = pager.select(0).unwrap();
        assert_eq!(selection.error_message.as_deref(), Some("no such table: t"));
        assert!(selection.summary.contains("failed"));
        assert!(pager.select(1).is_none());
    }

    #[test]
    fn test_find_searches_all_pages() {
        let pager = pager_with(23);
        assert_eq!(pager.find(HistoryId::new(2)).unwrap().query, "SELECT 2");
        assert!(pager.find(HistoryId::new(99)).is_none());
    }
}

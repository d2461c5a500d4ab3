//! Session facade
//!
//! [`SqlRunner`] ties the executor, the history store and the pager together.
//! Every query attempt is recorded, whatever its outcome, and the pager is
//! refreshed afterwards so the next page request sees it.

use crate::classifier::BackendKind;
use crate::config::Config;
use crate::error::{Error, ExecutionFailure, Result};
use crate::executor::Executor;
use crate::history_store::{HistoryRecord, HistoryStore, Outcome};
use crate::pager::{HistoryPage, HistoryPager, Selection};
use crate::result_set::ResultSet;
use crate::types::HistoryId;

/// Outcome of one `run_query` call
#[derive(Debug)]
pub struct QueryRun {
    pub result: std::result::Result<ResultSet, ExecutionFailure>,
    /// False when the attempt could not be written to history
    pub history_saved: bool,
}

impl QueryRun {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct SqlRunner {
    executor: Executor,
    store: HistoryStore,
    pager: HistoryPager,
}

impl SqlRunner {
    /// Open the configured history store and wire up the real backends
    pub fn new(config: Config) -> Result<Self> {
        Self::with_executor(config, Executor::new())
    }

    pub fn with_executor(config: Config, executor: Executor) -> Result<Self> {
        let store = HistoryStore::open(&config.history_file)?;
        let mut pager = HistoryPager::new(config.page_size);
        pager.replace(store.list_all());

        Ok(Self {
            executor,
            store,
            pager,
        })
    }

    pub fn pager(&self) -> &HistoryPager {
        &self.pager
    }

    /// Open and close a connection. Never recorded in history.
    pub fn test_connection(
        &self,
        connection_string: &str,
    ) -> std::result::Result<BackendKind, ExecutionFailure> {
        self.executor.test_connection(connection_string)
    }

    /// Execute `query` and record the attempt. Both inputs are trimmed first.
    pub fn run_query(&mut self, connection_string: &str, query: &str) -> QueryRun {
        let connection_string = connection_string.trim();
        let query = query.trim();
        let result = self.executor.execute(connection_string, query);

        let outcome = match &result {
            Ok(rs) => Outcome::succeeded(rs.row_count()),
            Err(failure) => Outcome::failed(failure.report()),
        };

        let history_saved = match self.store.append(connection_string, query, &outcome) {
            Ok(id) => {
                tracing::debug!(%id, "recorded query in history");
                true
            }
            Err(e) => {
                tracing::warn!("query history not saved: {}", e);
                false
            }
        };

        self.reload();
        QueryRun {
            result,
            history_saved,
        }
    }

    /// Run a stored query again against its stored connection string
    pub fn replay(&mut self, id: HistoryId) -> Result<QueryRun> {
        let record = self.find(id)?;
        let (connection_string, query) = (record.connection_string.clone(), record.query.clone());
        Ok(self.run_query(&connection_string, &query))
    }

    /// Move to `page` (clamped) and return it
    pub fn history_page(&mut self, page: usize) -> HistoryPage {
        self.pager.go_to(page);
        self.pager.snapshot()
    }

    pub fn select(&self, index_on_page: usize) -> Option<Selection> {
        self.pager.select(index_on_page)
    }

    pub fn find(&self, id: HistoryId) -> Result<&HistoryRecord> {
        self.pager.find(id).ok_or(Error::HistoryNotFound { id: id.as_i64() })
    }

    /// Delete every history record
    pub fn purge_history(&mut self) -> Result<usize> {
        let deleted = self.store.purge_all()?;
        self.reload();
        Ok(deleted)
    }

    /// Connection string of the newest record, used to prefill the editor
    pub fn last_connection_string(&self) -> Option<String> {
        self.store.latest().map(|r| r.connection_string)
    }

    /// Re-read the store into the pager
    pub fn reload(&mut self) {
        self.pager.replace(self.store.list_all());
    }
}

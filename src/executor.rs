//! Query execution across the supported backends
//!
//! The executor classifies each connection string, opens exactly the backend
//! it names, and for ambiguous strings tries SQLite first and then SQL
//! Server. The order is fixed; it is not a retry loop.

use crate::backend::{BackendError, QueryBackend};
use crate::classifier::{self, BackendKind, Classification};
use crate::error::ExecutionFailure;
use crate::result_set::ResultSet;
use crate::sql_server::SqlServerBackend;
use crate::sqlite::SqliteBackend;

/// Runs statements against whichever backend a connection string selects
pub struct Executor {
    sqlite: Box<dyn QueryBackend>,
    sql_server: Box<dyn QueryBackend>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Executor wired to the real SQLite and SQL Server drivers
    pub fn new() -> Self {
        Self::with_backends(
            Box::new(SqliteBackend::new()),
            Box::new(SqlServerBackend::new()),
        )
    }

    pub fn with_backends(
        sqlite: Box<dyn QueryBackend>,
        sql_server: Box<dyn QueryBackend>,
    ) -> Self {
        Self { sqlite, sql_server }
    }

    fn backend(&self, kind: BackendKind) -> &dyn QueryBackend {
        match kind {
            BackendKind::Sqlite => self.sqlite.as_ref(),
            BackendKind::SqlServer => self.sql_server.as_ref(),
        }
    }

    /// Run `query` verbatim and return its first result set
    pub fn execute(
        &self,
        connection_string: &str,
        query: &str,
    ) -> Result<ResultSet, ExecutionFailure> {
        self.dispatch(connection_string, |backend, cs| backend.execute(cs, query))
            .map(|(_, result)| result)
    }

    /// Open and close a connection; returns the backend that answered
    pub fn test_connection(&self, connection_string: &str) -> Result<BackendKind, ExecutionFailure> {
        self.dispatch(connection_string, |backend, cs| backend.ping(cs))
            .map(|(kind, ())| kind)
    }

    fn dispatch<T>(
        &self,
        connection_string: &str,
        op: impl Fn(&dyn QueryBackend, &str) -> Result<T, BackendError>,
    ) -> Result<(BackendKind, T), ExecutionFailure> {
        let normalized = classifier::classify(connection_string);
        let cs = normalized.connection_string;

        match normalized.classification {
            Classification::Known(kind) => {
                let backend = self.backend(kind);
                tracing::debug!(backend = %backend.kind(), "executing against classified backend");
                op(backend, &cs)
                    .map(|value| (kind, value))
                    .map_err(|e| failure(kind, e, &cs))
            }
            Classification::Ambiguous => self.fallback(&cs, op),
        }
    }

    /// SQLite first, then SQL Server. Both errors are reported if both fail.
    fn fallback<T>(
        &self,
        cs: &str,
        op: impl Fn(&dyn QueryBackend, &str) -> Result<T, BackendError>,
    ) -> Result<(BackendKind, T), ExecutionFailure> {
        let sqlite_cs = if cs.contains('=') {
            cs.to_string()
        } else {
            classifier::sqlite_connection_string(cs)
        };

        // Opens with the usual create flags, so a missing file is created here
        let sqlite_err = match op(self.sqlite.as_ref(), &sqlite_cs) {
            Ok(value) => return Ok((self.sqlite.kind(), value)),
            Err(e) => e,
        };
        tracing::debug!("SQLite attempt failed, trying SQL Server: {}", sqlite_err);

        let server_err = match op(self.sql_server.as_ref(), cs) {
            Ok(value) => return Ok((self.sql_server.kind(), value)),
            Err(e) => e,
        };

        let message = format!(
            "Could not connect to the database.\n\n\
             SQLite error: {}\n\n\
             SQL Server error: {}\n\n\
             Please check the connection string.",
            sqlite_err.message, server_err.message
        );
        Err(ExecutionFailure::new(None, message, cs)
            .with_cause(labelled(sqlite_err.cause, server_err.cause))
            .with_trace(labelled(sqlite_err.trace, server_err.trace)))
    }
}

fn failure(kind: BackendKind, err: BackendError, cs: &str) -> ExecutionFailure {
    ExecutionFailure::new(Some(kind), err.message, cs)
        .with_cause(err.cause)
        .with_trace(err.trace)
}

/// Merge per-backend details, naming the backend each line came from
fn labelled(sqlite: Option<String>, sql_server: Option<String>) -> Option<String> {
    let parts: Vec<String> = [
        (BackendKind::Sqlite, sqlite),
        (BackendKind::SqlServer, sql_server),
    ]
    .into_iter()
    .filter_map(|(kind, text)| text.map(|t| format!("{}: {}", kind, t)))
    .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}


#[cfg(test)]
mod tests {
    use super::fakes::{CallLog, FakeBackend};
    use super::*;
    use crate::guidance::Guidance;
    use crate::result_set::{CellValue, ColumnDescriptor};

    fn one_row(value: i64) -> ResultSet {
        ResultSet::new(
            vec![ColumnDescriptor::new("n", None)],
            vec![vec![CellValue::Integer(value)]],
        )
    }

    fn executor(
        sqlite: Result<ResultSet, &str>,
        server: Result<ResultSet, &str>,
    ) -> (Executor, CallLog) {
        let calls = CallLog::default();
        let make = |kind, outcome: Result<ResultSet, &str>| -> Box<dyn QueryBackend> {
            match outcome {
                Ok(rs) => FakeBackend::ok(kind, rs, &calls),
                Err(msg) => FakeBackend::failing(kind, msg, &calls),
            }
        };
        let exec = Executor::with_backends(
            make(BackendKind::Sqlite, sqlite),
            make(BackendKind::SqlServer, server),
        );
        (exec, calls)
    }

    #[test]
    fn test_known_sql_server_goes_straight_there() {
        let (exec, calls) = executor(Err("unused"), Ok(one_row(1)));
        let rs = exec
            .execute("Server=db;Initial Catalog=app", "SELECT 1")
            .unwrap();
        assert_eq!(rs.row_count(), 1);

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, BackendKind::SqlServer);
        assert_eq!(calls[0].query.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_bare_path_is_normalized_for_sqlite() {
        let (exec, calls) = executor(Ok(ResultSet::default()), Err("unused"));
        exec.execute("C:\\\\data\\\\app.db", "SELECT 1").unwrap();

        let calls = calls.borrow();
        assert_eq!(calls[0].kind, BackendKind::Sqlite);
        assert_eq!(
            calls[0].connection_string,
            "Data Source=C:\\data\\app.db;Version=3;"
        );
    }

    #[test]
    fn test_known_backend_failure_is_wrapped() {
        let (exec, calls) = executor(Err("unable to open database file"), Err("unused"));
        let failure = exec.execute("/nope/app.db", "SELECT 1").unwrap_err();

        assert_eq!(failure.backend, Some(BackendKind::Sqlite));
        assert_eq!(failure.message, "unable to open database file");
        assert_eq!(
            failure.connection_string,
            "Data Source=/nope/app.db;Version=3;"
        );
        assert_eq!(failure.guidance, Some(Guidance::MissingFile));
        // No fallback for a classified string.
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_ambiguous_falls_back_to_sql_server() {
        let (exec, calls) = executor(Err("no such table: orders"), Ok(one_row(7)));
        let rs = exec
            .execute("Data Source=warehouse;User Id=sa;Password=x", "SELECT * FROM orders")
            .unwrap();
        assert_eq!(rs.rows[0][0], CellValue::Integer(7));

        let calls = calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, BackendKind::Sqlite);
        assert_eq!(calls[1].kind, BackendKind::SqlServer);
        assert_eq!(
            calls[1].connection_string,
            "Data Source=warehouse;User Id=sa;Password=x"
        );
    }

    #[test]
    fn test_ambiguous_sqlite_success_skips_sql_server() {
        let (exec, calls) = executor(Ok(one_row(3)), Ok(one_row(9)));
        let rs = exec.execute("inventory", "SELECT 3").unwrap();
        assert_eq!(rs.rows[0][0], CellValue::Integer(3));

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].connection_string,
            "Data Source=inventory;Version=3;"
        );
    }

    #[test]
    fn test_ambiguous_both_fail_reports_both() {
        let (exec, _) = executor(Err("file is not a database"), Err("Login failed for user 'sa'."));
        let failure = exec.execute("inventory", "SELECT 1").unwrap_err();

        assert_eq!(failure.backend, None);
        assert!(failure.message.contains("SQLite error: file is not a database"));
        assert!(failure.message.contains("SQL Server error: Login failed"));
        assert!(failure.message.contains("check the connection string"));
        assert_eq!(failure.connection_string, "inventory");
        assert_eq!(failure.guidance, Some(Guidance::Authentication));
    }

    #[test]
    fn test_test_connection_reports_backend() {
        let (exec, calls) = executor(Err("nope"), Ok(ResultSet::default()));
        assert_eq!(
            exec.test_connection("Data Source=db01;User Id=sa").unwrap(),
            BackendKind::SqlServer
        );
        assert!(calls.borrow().iter().all(|c| c.query.is_none()));
    }

    #[test]
    fn test_real_sqlite_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("real.db");
        let exec = Executor::new();
        let cs = path.display().to_string();

        exec.execute(&cs, "CREATE TABLE t (v TEXT)").unwrap();
        exec.execute(&cs, "INSERT INTO t VALUES ('x')").unwrap();
        let rs = exec.execute(&cs, "SELECT v FROM t").unwrap();
        assert_eq!(rs.rows, vec![vec![CellValue::Text("x".into())]]);
        assert_eq!(exec.test_connection(&cs).unwrap(), BackendKind::Sqlite);
    }

    #[test]
    fn test_ambiguous_data_source_creates_sqlite_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("inventory");
        let cs = format!("Data Source={}", path.display());
        let exec = Executor::new();

        let rs = exec.execute(&cs, "CREATE TABLE t (x)").unwrap();
        assert!(rs.columns.is_empty());
        assert!(path.exists());
        assert_eq!(exec.test_connection(&cs).unwrap(), BackendKind::Sqlite);
    }

    #[test]
    fn test_both_fail_keeps_each_backends_details() {
        let calls = CallLog::default();
        let sqlite = FakeBackend {
            kind: BackendKind::Sqlite,
            outcome: Err(BackendError {
                message: "file is not a database".into(),
                cause: Some("Error code 26".into()),
                trace: None,
            }),
            calls: calls.clone(),
        };
        let server = FakeBackend {
            kind: BackendKind::SqlServer,
            outcome: Err(BackendError {
                message: "Login failed".into(),
                cause: Some("Token error".into()),
                trace: Some("Error 18456, state 1".into()),
            }),
            calls: calls.clone(),
        };
        let exec = Executor::with_backends(Box::new(sqlite), Box::new(server));

        let failure = exec.execute("inventory", "SELECT 1").unwrap_err();
        assert_eq!(
            failure.cause.as_deref(),
            Some("SQLite: Error code 26\nSQL Server: Token error")
        );
        assert_eq!(failure.trace.as_deref(), Some("SQL Server: Error 18456, state 1"));
    }

    #[test]
    fn test_labelled_details() {
        assert_eq!(labelled(None, None), None);
        assert_eq!(
            labelled(Some("a".into()), None).as_deref(),
            Some("SQLite: a")
        );
    }
}

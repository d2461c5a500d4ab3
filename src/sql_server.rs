//! SQL Server backend
//!
//! Connects with tiberius over a private current-thread tokio runtime, so the
//! rest of the crate stays synchronous. Connection strings are ADO.NET style
//! and handed to `Config::from_ado_string`; named instances are resolved
//! through the SQL Browser service.

use crate::backend::{BackendError, QueryBackend};
use crate::classifier::{BackendKind, ConnectionProperties};
use crate::result_set::{CellValue, ColumnDescriptor, ResultSet};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::time::Duration;
use tiberius::{Client, ColumnData, Config, FromSql, SqlBrowser};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// Connect timeout used when the connection string does not set one
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

type SqlClient = Client<Compat<TcpStream>>;

/// Networked SQL Server driver built on tiberius
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerBackend;

impl SqlServerBackend {
    pub fn new() -> Self {
        Self
    }

    fn runtime() -> Result<Runtime, BackendError> {
        Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BackendError::from_error(&e))
    }
}

impl QueryBackend for SqlServerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SqlServer
    }

    fn ping(&self, connection_string: &str) -> Result<(), BackendError> {
        let runtime = Self::runtime()?;
        runtime.block_on(async {
            let client = connect(connection_string).await?;
            client.close().await.map_err(server_error)
        })
    }

    fn execute(&self, connection_string: &str, query: &str) -> Result<ResultSet, BackendError> {
        let runtime = Self::runtime()?;
        runtime.block_on(async {
            let mut client = connect(connection_string).await?;
            let result = run_query(&mut client, query).await.map_err(server_error)?;
            if let Err(e) = client.close().await {
                tracing::debug!("closing SQL Server connection failed: {}", e);
            }
            Ok(result)
        })
    }
}

/// `Connect Timeout` in seconds; zero means wait indefinitely
fn connect_timeout(connection_string: &str) -> Option<Duration> {
    let props = ConnectionProperties::parse(connection_string);
    let secs = props
        .get_any(&["connect timeout", "connection timeout", "timeout"])
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
    (secs > 0).then(|| Duration::from_secs(secs))
}

async fn connect(connection_string: &str) -> Result<SqlClient, BackendError> {
    let config = Config::from_ado_string(connection_string).map_err(server_error)?;

    match connect_timeout(connection_string) {
        Some(limit) => match tokio::time::timeout(limit, open_client(config)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::new(format!(
                "Connection timed out after {} seconds",
                limit.as_secs()
            ))),
        },
        None => open_client(config).await,
    }
}

async fn open_client(config: Config) -> Result<SqlClient, BackendError> {
    let tcp = TcpStream::connect_named(&config)
        .await
        .map_err(server_error)?;
    tcp.set_nodelay(true)
        .map_err(|e| BackendError::from_error(&e))?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        // Azure SQL and failover partners redirect once to another host.
        Err(tiberius::error::Error::Routing { host, port }) => {
            tracing::debug!(%host, port, "following SQL Server routing redirect");
            let mut config = config;
            config.host(&host);
            config.port(port);

            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| BackendError::from_error(&e))?;
            tcp.set_nodelay(true)
                .map_err(|e| BackendError::from_error(&e))?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(server_error)
        }
        Err(e) => Err(server_error(e)),
    }
}

async fn run_query(
    client: &mut SqlClient,
    query: &str,
) -> Result<ResultSet, tiberius::error::Error> {
    let mut stream = client.simple_query(query).await?;

    let columns: Vec<ColumnDescriptor> = stream
        .columns()
        .await?
        .map(|cols| {
            cols.iter()
                .map(|c| ColumnDescriptor::new(c.name(), Some(format!("{:?}", c.column_type()))))
                .collect()
        })
        .unwrap_or_default();

    let rows = stream
        .into_first_result()
        .await?
        .into_iter()
        .map(|row| row.into_iter().map(cell_value).collect())
        .collect();

    Ok(ResultSet::new(columns, rows))
}

fn cell_value(data: ColumnData<'static>) -> CellValue {
    match data {
        ColumnData::U8(v) => v.map_or(CellValue::Null, |v| CellValue::Integer(v.into())),
        ColumnData::I16(v) => v.map_or(CellValue::Null, |v| CellValue::Integer(v.into())),
        ColumnData::I32(v) => v.map_or(CellValue::Null, |v| CellValue::Integer(v.into())),
        ColumnData::I64(v) => v.map_or(CellValue::Null, CellValue::Integer),
        ColumnData::F32(v) => v.map_or(CellValue::Null, |v| CellValue::Real(v.into())),
        ColumnData::F64(v) => v.map_or(CellValue::Null, CellValue::Real),
        ColumnData::Bit(v) => v.map_or(CellValue::Null, CellValue::Bool),
        ColumnData::String(v) => v.map_or(CellValue::Null, |s| CellValue::Text(s.into_owned())),
        ColumnData::Guid(v) => v.map_or(CellValue::Null, |g| CellValue::Text(g.to_string())),
        ColumnData::Binary(v) => v.map_or(CellValue::Null, |b| CellValue::Blob(b.into_owned())),
        ColumnData::Numeric(v) => v.map_or(CellValue::Null, |n| CellValue::Text(n.to_string())),
        ColumnData::Xml(v) => v.map_or(CellValue::Null, |x| {
            CellValue::Text(x.into_owned().into_string())
        }),
        other => temporal_value(&other),
    }
}

/// Date and time columns come in several wire encodings; let chrono's
/// `FromSql` impls sort them out and render ISO text.
fn temporal_value(data: &ColumnData<'static>) -> CellValue {
    if let Ok(value) = NaiveDateTime::from_sql(data) {
        return value.map_or(CellValue::Null, |v| {
            CellValue::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())
        });
    }
    if let Ok(value) = NaiveDate::from_sql(data) {
        return value.map_or(CellValue::Null, |v| CellValue::Text(v.to_string()));
    }
    if let Ok(value) = NaiveTime::from_sql(data) {
        return value.map_or(CellValue::Null, |v| CellValue::Text(v.to_string()));
    }
    if let Ok(value) = DateTime::<FixedOffset>::from_sql(data) {
        return value.map_or(CellValue::Null, |v| CellValue::Text(v.to_rfc3339()));
    }
    CellValue::Text(format!("{:?}", data))
}

fn server_error(err: tiberius::error::Error) -> BackendError {
    let backend_err = BackendError::from_error(&err);
    match &err {
        tiberius::error::Error::Server(token) => backend_err.with_trace(format!(
            "Error {}, state {}, class {}, server '{}', procedure '{}', line {}",
            token.code(),
            token.state(),
            token.class(),
            token.server(),
            token.procedure(),
            token.line()
        )),
        _ => backend_err,
    }
}

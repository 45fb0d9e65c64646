//! Connection implementation.
//!
//! This module provides the `Connection` type which runs statements on the
//! query service and hands back their results.

use crate::connection::params::ConnectionParams;
use crate::error::{AthenaError, QueryError};
use crate::query::{
    interpolate, ExecutionController, NamedValue, QueryExecution, RowStream, StatementKind,
};
use crate::transport::RemoteQueryService;
use arrow::array::RecordBatch;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Session over a query service.
///
/// A `Connection` executes statements one at a time per call, but is safe to
/// share across tasks: every `execute` drives its own query.
///
/// # Example
///
/// ```no_run
/// use athena_rs::driver::Driver;
/// use athena_rs::transport::SyntheticQueryService;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let database = Driver::new().open("s3://my-bucket/results")?;
/// let connection = database.connect(Arc::new(SyntheticQueryService::new(vec![], 0)));
///
/// let csv = connection.query_csv("SELECT 1").await?;
/// println!("{}", csv);
///
/// connection.close();
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    /// Query service shared with other connections
    service: Arc<dyn RemoteQueryService>,
    /// Connection parameters
    params: ConnectionParams,
    /// Parent of every in-flight query's cancellation token
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl Connection {
    pub(crate) fn new(service: Arc<dyn RemoteQueryService>, params: ConnectionParams) -> Self {
        Self {
            service,
            params,
            cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Get the connection parameters.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Check if the connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Bind `params` into `template`, producing the SQL text to execute.
    ///
    /// Placeholders are either positional (`?`) or named (`:name`).
    ///
    /// # Errors
    ///
    /// Returns `QueryError::ParameterBindingError` when the parameters do not
    /// match the placeholders, and `QueryError::UnsupportedParameter` for a
    /// value that has no SQL literal form.
    pub fn prepare(&self, template: &str, params: &[NamedValue]) -> Result<String, QueryError> {
        interpolate(template, params)
    }

    /// Execute a statement and wait for it to reach a terminal state.
    ///
    /// On success the returned handle gives access to the execution record and
    /// to the result rows.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidState` if the connection is closed and
    /// `QueryError::ReadOnly` if the connection is read-only and the statement
    /// is not. Otherwise fails the way [`ExecutionController::execute`] does.
    pub async fn execute(&self, sql: &str) -> Result<QueryHandle, QueryError> {
        if self.is_closed() {
            return Err(QueryError::InvalidState("Connection is closed".to_string()));
        }

        let kind = StatementKind::from_sql(sql);
        if self.params.read_only && !kind.is_read_only() {
            return Err(QueryError::ReadOnly(format!(
                "{:?} statements are not allowed on a read-only connection",
                kind
            )));
        }

        let options = self
            .params
            .execution_options()
            .with_cancellation(self.cancel.child_token());
        let mut controller = ExecutionController::new(Arc::clone(&self.service), options);
        let execution = controller.execute(sql).await?.clone();

        debug!(query_id = %execution.id(), ?kind, "Statement executed");

        let rows = controller.into_rows()?;
        Ok(QueryHandle {
            execution,
            rows: Some(rows),
        })
    }

    /// Bind `params` into `template` and execute the result.
    pub async fn execute_with(
        &self,
        template: &str,
        params: &[NamedValue],
    ) -> Result<QueryHandle, QueryError> {
        let sql = self.prepare(template, params)?;
        self.execute(&sql).await
    }

    /// Execute a statement and return its full result as CSV text.
    pub async fn query_csv(&self, sql: &str) -> Result<String, QueryError> {
        let mut handle = self.execute(sql).await?;
        handle.fetch_rows()?.collect_csv().await
    }

    /// Execute a statement and return its full result as Arrow batches, one
    /// per non-empty page.
    pub async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>, AthenaError> {
        let mut handle = self.execute(sql).await?;
        let mut rows = handle.fetch_rows()?;

        let mut batches = Vec::new();
        while let Some(batch) = rows.next_batch().await? {
            if batch.num_rows() > 0 || batches.is_empty() {
                batches.push(batch);
            }
        }
        Ok(batches)
    }

    /// Close the connection, cancelling queries still being polled.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(output_location = %self.params.output_location, "Closing connection");
            self.cancel.cancel();
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("params", &self.params)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A finished statement: its execution record plus its unread results.
#[derive(Debug)]
pub struct QueryHandle {
    execution: QueryExecution,
    rows: Option<RowStream>,
}

impl QueryHandle {
    /// Execution record of the statement.
    pub fn execution(&self) -> &QueryExecution {
        &self.execution
    }

    /// Service-assigned identifier of the statement.
    pub fn query_id(&self) -> &str {
        self.execution.id()
    }

    /// Take the result rows.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidState` if the rows were already taken or
    /// the handle was closed.
    pub fn fetch_rows(&mut self) -> Result<RowStream, QueryError> {
        self.rows.take().ok_or_else(|| {
            QueryError::InvalidState(format!(
                "Results of query {} were already consumed",
                self.execution.id()
            ))
        })
    }

    /// Release the results without reading them. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut rows) = self.rows.take() {
            rows.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionBuilder;
    use crate::query::Value;
    use crate::transport::{ColumnInfo, SyntheticQueryService};
    use std::time::Duration;

    fn connection(read_only: bool) -> Connection {
        let params = ConnectionBuilder::new()
            .output_location("s3://bucket/out")
            .poll_interval(Duration::from_millis(1))
            .read_only(read_only)
            .build()
            .unwrap();
        let service = SyntheticQueryService::new(
            vec![
                ColumnInfo::new("id", "integer"),
                ColumnInfo::new("name", "varchar"),
            ],
            3,
        )
        .with_page_size(2);
        Connection::new(Arc::new(service), params)
    }

    #[tokio::test]
    async fn test_query_csv_has_one_header() {
        let csv = connection(false).query_csv("SELECT id, name FROM t").await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "id,name");
    }

    #[tokio::test]
    async fn test_query_batches() {
        let batches = connection(false).query("SELECT id, name FROM t").await.unwrap();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();

        assert_eq!(total, 3);
        assert_eq!(batches[0].num_columns(), 2);
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let conn = connection(true);

        let err = conn.execute("INSERT INTO t VALUES (1)").await.unwrap_err();
        assert!(matches!(err, QueryError::ReadOnly(_)));

        let err = conn.execute("DROP TABLE t").await.unwrap_err();
        assert!(matches!(err, QueryError::ReadOnly(_)));

        assert!(conn.execute("SELECT 1").await.is_ok());
        assert!(conn.execute("SHOW TABLES").await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_execute() {
        let conn = connection(false);
        conn.close();
        conn.close();

        assert!(conn.is_closed());
        let err = conn.execute("SELECT 1").await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_rows_taken_once() {
        let mut handle = connection(false).execute("SELECT 1").await.unwrap();
        assert!(handle.query_id().starts_with("synthetic-"));

        let _rows = handle.fetch_rows().unwrap();
        assert!(matches!(handle.fetch_rows(), Err(QueryError::InvalidState(_))));

        handle.close();
        handle.close();
    }

    #[tokio::test]
    async fn test_execute_with_binds_parameters() {
        let conn = connection(false);
        let params = vec![NamedValue::positional(1, Value::from("o'brien"))];

        assert_eq!(
            conn.prepare("SELECT * FROM t WHERE name = ?", &params).unwrap(),
            "SELECT * FROM t WHERE name = 'o\\'brien'"
        );

        let handle = conn
            .execute_with("SELECT * FROM t WHERE name = ?", &params)
            .await
            .unwrap();
        assert_eq!(
            handle.execution().query_text(),
            "SELECT * FROM t WHERE name = 'o\\'brien'"
        );

        let err = conn.execute_with("SELECT ?, ?", &params).await.unwrap_err();
        assert!(matches!(err, QueryError::ParameterBindingError { .. }));
    }
}

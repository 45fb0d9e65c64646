//! Synchronous facade over [`Connection`].
//!
//! Each `BlockingConnection` owns a current-thread tokio runtime and drives the
//! async connection with `block_on`. It must not be used from inside another
//! tokio runtime.

use crate::connection::params::ConnectionParams;
use crate::driver::{Connection, QueryHandle};
use crate::error::{ConnectionError, QueryError};
use crate::query::{NamedValue, RowStream};
use crate::transport::{ColumnInfo, Row};
use tokio::runtime::Runtime;

/// Connection whose methods block the calling thread.
///
/// # Example
///
/// ```no_run
/// use athena_rs::driver::Driver;
/// use athena_rs::transport::{ColumnInfo, SyntheticQueryService};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = Arc::new(SyntheticQueryService::new(vec![ColumnInfo::new("n", "integer")], 5));
/// let connection = Driver::new().open("s3://bucket")?.connect_blocking(service)?;
///
/// let mut handle = connection.execute("SELECT n FROM t")?;
/// for row in connection.fetch_rows(&mut handle)? {
///     println!("{:?}", row?.get(0));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BlockingConnection {
    runtime: Runtime,
    inner: Connection,
}

impl BlockingConnection {
    /// Wrap `inner`, starting a dedicated runtime for it.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::RuntimeError` if the runtime cannot be built.
    pub fn new(inner: Connection) -> Result<Self, ConnectionError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                ConnectionError::RuntimeError(format!("Failed to create tokio runtime: {}", e))
            })?;
        Ok(Self { runtime, inner })
    }

    /// Get the connection parameters.
    pub fn params(&self) -> &ConnectionParams {
        self.inner.params()
    }

    /// See [`Connection::prepare`].
    pub fn prepare(&self, template: &str, params: &[NamedValue]) -> Result<String, QueryError> {
        self.inner.prepare(template, params)
    }

    /// Execute a statement, blocking until it reaches a terminal state.
    pub fn execute(&self, sql: &str) -> Result<QueryHandle, QueryError> {
        self.runtime.block_on(self.inner.execute(sql))
    }

    /// Bind `params` into `template` and execute the result.
    pub fn execute_with(
        &self,
        template: &str,
        params: &[NamedValue],
    ) -> Result<QueryHandle, QueryError> {
        self.runtime
            .block_on(self.inner.execute_with(template, params))
    }

    /// Iterate the rows of `handle`, fetching pages as needed.
    pub fn fetch_rows(&self, handle: &mut QueryHandle) -> Result<Rows<'_>, QueryError> {
        Ok(Rows {
            runtime: &self.runtime,
            stream: handle.fetch_rows()?,
            done: false,
        })
    }

    /// Execute a statement and return its full result as CSV text.
    pub fn query_csv(&self, sql: &str) -> Result<String, QueryError> {
        self.runtime.block_on(self.inner.query_csv(sql))
    }

    /// Check if the connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Close the connection. Safe to call more than once.
    pub fn close(&self) {
        self.inner.close();
    }
}

/// Blocking row iterator.
///
/// Yields rows until the results are exhausted. After an error, iteration
/// stops.
#[derive(Debug)]
pub struct Rows<'a> {
    runtime: &'a Runtime,
    stream: RowStream,
    done: bool,
}

impl Rows<'_> {
    /// Column metadata, available once the first page has been read.
    pub fn columns(&self) -> Option<&[ColumnInfo]> {
        self.stream.columns()
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.runtime.block_on(self.stream.next_row()) {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                self.stream.close();
                None
            }
            Err(e) => {
                self.done = true;
                self.stream.close();
                Some(Err(e))
            }
        }
    }
}

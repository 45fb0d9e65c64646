//! Database implementation.
//!
//! This module provides the `Database` type which holds validated connection
//! parameters and creates connections over a query service.

use crate::connection::params::ConnectionParams;
use crate::driver::{BlockingConnection, Connection};
use crate::error::ConnectionError;
use crate::transport::RemoteQueryService;
use std::str::FromStr;
use std::sync::Arc;

/// Connection factory.
///
/// # Example
///
/// ```no_run
/// use athena_rs::driver::Database;
/// use athena_rs::transport::SyntheticQueryService;
/// use std::str::FromStr;
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let database = Database::from_str("s3://my-bucket/results?db=sales")?;
/// let service = Arc::new(SyntheticQueryService::new(vec![], 0));
/// let connection = database.connect(service);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// Connection parameters
    params: ConnectionParams,
}

impl Database {
    /// Create a new Database instance from connection parameters.
    pub fn new(params: ConnectionParams) -> Self {
        Self { params }
    }

    /// Get the connection parameters.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Connection string equivalent to the parameters (attributes omitted).
    pub fn connection_string(&self) -> String {
        format!(
            "{}?region={}&db={}&workgroup={}",
            self.params.output_location,
            self.params.region,
            self.params.database,
            self.params.work_group
        )
    }

    /// Create a connection that runs queries on `service`.
    ///
    /// The service is shared: any number of connections may use the same one
    /// concurrently.
    pub fn connect(&self, service: Arc<dyn RemoteQueryService>) -> Connection {
        Connection::new(service, self.params.clone())
    }

    /// Create a blocking connection that runs queries on `service`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::RuntimeError` if the runtime cannot start.
    pub fn connect_blocking(
        &self,
        service: Arc<dyn RemoteQueryService>,
    ) -> Result<BlockingConnection, ConnectionError> {
        BlockingConnection::new(self.connect(service))
    }
}

impl FromStr for Database {
    type Err = ConnectionError;

    /// Parse a connection string to create a Database instance.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let params = ConnectionParams::from_str(s)?;
        Ok(Self::new(params))
    }
}

impl std::fmt::Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database({})", self.connection_string())
    }
}

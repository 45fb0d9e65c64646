//! # athena-rs
//!
//! SQL driver for submit/poll/paginate query services with Apache Arrow
//! result support.
//!
//! A query is submitted, its status is polled until it reaches a terminal
//! state, and its results are read page by page. The driver hides that
//! lifecycle behind a connection that executes statements and hands back
//! rows, CSV text or Arrow record batches. Any service implementing
//! [`transport::RemoteQueryService`] can be plugged in; a network-free
//! [`transport::SyntheticQueryService`] is included.
//!
//! ## Example
//!
//! ```no_run
//! # use athena_rs::*;
//! # use athena_rs::transport::{ColumnInfo, SyntheticQueryService};
//! # use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create driver and open database
//! let driver = Driver::new();
//! let database = driver.open("s3://my-bucket/results?db=sales&report_cost=true")?;
//!
//! // Connect to a query service
//! let service = Arc::new(SyntheticQueryService::new(
//!     vec![ColumnInfo::new("id", "integer"), ColumnInfo::new("name", "varchar")],
//!     100,
//! ));
//! let connection = database.connect(service);
//!
//! // Execute a query
//! let results = connection.query("SELECT name FROM customers").await?;
//!
//! // Process Arrow RecordBatch
//! for batch in results {
//!     println!("Rows: {}", batch.num_rows());
//! }
//!
//! // Close connection
//! connection.close();
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod arrow_conversion;
pub mod connection;
pub mod driver;
pub mod error;
pub mod query;
pub mod transport;
pub mod types;

// Re-export public API
pub use arrow_conversion::ArrowConverter;
pub use connection::{ConnectionBuilder, ConnectionParams};
pub use driver::{BlockingConnection, Connection, Database, Driver, QueryHandle};
pub use error::{AthenaError, ConnectionError, ConversionError, QueryError, TransportError};
pub use types::{AthenaType, TypeMapper};

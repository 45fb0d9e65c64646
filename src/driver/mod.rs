//! Driver interface implementation.
//!
//! This module provides the driver-facing API of athena-rs: opening a database
//! from a connection string, connecting it to a query service and running
//! statements.
//!
//! # Architecture
//!
//! The driver interface is organized into four main components:
//! - `Driver` - Driver metadata and factory for creating databases
//! - `Database` - Connection factory with connection string parsing
//! - `Connection` - Async session for executing statements
//! - `BlockingConnection` - Synchronous facade with a row iterator
//!
//! # Example
//!
//! ```no_run
//! use athena_rs::driver::Driver;
//! use athena_rs::transport::{ColumnInfo, SyntheticQueryService};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = Driver::new();
//! let database = driver.open("s3://my-bucket/results?db=sales")?;
//!
//! let service = Arc::new(SyntheticQueryService::new(vec![ColumnInfo::new("id", "integer")], 3));
//! let connection = database.connect(service);
//!
//! let mut handle = connection.execute("SELECT id FROM orders").await?;
//! let csv = handle.fetch_rows()?.collect_csv().await?;
//! println!("{}", csv);
//!
//! connection.close();
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod connection;
pub mod database;
#[allow(clippy::module_inception)]
pub mod driver;

// Re-export commonly used types
pub use blocking::{BlockingConnection, Rows};
pub use connection::{Connection, QueryHandle};
pub use database::Database;
pub use driver::Driver;

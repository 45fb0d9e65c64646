//! Query execution and result handling.
//!
//! This module provides the core query lifecycle for athena-rs: rendering
//! parameters into query text, driving a submitted query to a terminal state,
//! and paging its results out of the service.
//!
//! # Overview
//!
//! The query module is organized into:
//! - `escape` - Backslash escaping for inlined string literals
//! - `params` - Parameter values, named/positional adaptation and interpolation
//! - `statement` - Statement classification from SQL text
//! - `execution` - Submit/poll state machine and timeout policy
//! - `results` - CSV projection and the lazy row cursor
//! - `cost` - Cost estimate from bytes scanned
//!
//! # Example
//!
//! ```no_run
//! use athena_rs::query::{interpolate, named_values_from_values, ExecutionController, ExecutionOptions, Value};
//! use athena_rs::transport::{ColumnInfo, SyntheticQueryService};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = Arc::new(SyntheticQueryService::new(vec![ColumnInfo::new("age", "integer")], 10));
//!
//! let params = named_values_from_values(vec![Value::from(18)]);
//! let sql = interpolate("SELECT age FROM users WHERE age > ?", &params)?;
//!
//! let mut controller = ExecutionController::new(service, ExecutionOptions::default());
//! controller.execute(&sql).await?;
//!
//! let mut rows = controller.into_rows()?;
//! while let Some(row) = rows.next_row().await? {
//!     println!("{:?}", row.get(0));
//! }
//! # Ok(())
//! # }
//! ```

pub mod cost;
pub mod escape;
pub mod execution;
pub mod params;
pub mod results;
pub mod statement;

// Re-export commonly used types
pub use cost::{format_bytes, CostEstimate};
pub use escape::{escape_bytes_backslash, escape_str_backslash};
pub use execution::{
    is_query_timed_out, is_timed_out, ExecutionController, ExecutionOptions, ExecutionPhase,
    QueryExecution, DML_TIMEOUT,
};
pub use params::{
    interpolate, named_values_from_values, placeholder_count, values_from_named_values,
    NamedValue, Value,
};
pub use results::{to_data_line, to_full_text, to_header_line, CsvProjection, RowStream};
pub use statement::StatementKind;

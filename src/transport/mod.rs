//! Transport layer for the remote query service.
//!
//! This module provides the service abstraction the execution controller talks
//! to, the message types it exchanges, and a synthetic in-process service that
//! answers queries with generated rows.
//!
//! # Architecture
//!
//! The transport layer is organized into:
//! - `protocol` - Remote query service trait definition
//! - `messages` - Request, status and result page types
//! - `synthetic` - Network-free service producing sample data
//!
//! # Example
//!
//! ```no_run
//! use athena_rs::transport::{
//!     ColumnInfo, RemoteQueryService, SubmitRequest, SyntheticQueryService,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = SyntheticQueryService::new(vec![ColumnInfo::new("id", "integer")], 3);
//!
//! let id = service.submit(&SubmitRequest::new("SELECT id FROM t")).await?;
//! let status = service.get_status(&id).await?;
//! println!("{} is {}", id, status.state);
//!
//! let page = service.get_results_page(&id, None).await?;
//! println!("{} rows", page.rows.len());
//! # Ok(())
//! # }
//! ```

pub mod messages;
pub mod protocol;
pub mod synthetic;

// Re-export commonly used types
pub use messages::{
    ColumnInfo, QueryState, QueryStatistics, QueryStatus, ResultPage, Row, StatementType,
    SubmitRequest,
};
pub use protocol::RemoteQueryService;
pub use synthetic::SyntheticQueryService;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Verify that key types are exported and accessible
        let _request = SubmitRequest::new("SELECT 1");
        let _column = ColumnInfo::new("c1", "varchar");
        let _row = Row::from_texts(["a"]);
        let _service = SyntheticQueryService::new(vec![], 0);
    }
}

//! Remote query service abstraction trait.
//!
//! This module defines the `RemoteQueryService` trait that abstracts the
//! asynchronous submit/poll/paginate API of the query service. Session setup,
//! credentials and the HTTP calls themselves live behind implementations of
//! this trait.

use crate::error::TransportError;
use async_trait::async_trait;

use super::messages::{QueryStatus, ResultPage, SubmitRequest};

/// Remote query service used by the execution controller.
///
/// Implementations must be safe to share between concurrently running
/// executions; every method takes `&self`.
#[async_trait]
pub trait RemoteQueryService: Send + Sync {
    /// Start a query execution.
    ///
    /// # Returns
    ///
    /// The execution id assigned by the service.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the call fails or the service rejects the query.
    async fn submit(&self, request: &SubmitRequest) -> Result<String, TransportError>;

    /// Observe the current status of an execution.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the call fails. A query that failed remotely
    /// is reported as `Ok` with a `FAILED` state, not as an error.
    async fn get_status(&self, execution_id: &str) -> Result<QueryStatus, TransportError>;

    /// Fetch one page of results of a succeeded execution.
    ///
    /// # Arguments
    ///
    /// * `execution_id` - Execution to read
    /// * `page_token` - Continuation token from the previous page, `None` for the first page
    async fn get_results_page(
        &self,
        execution_id: &str,
        page_token: Option<String>,
    ) -> Result<ResultPage, TransportError>;

    /// Ask the service to stop an execution.
    async fn cancel(&self, execution_id: &str) -> Result<(), TransportError>;
}

//! Common test utilities for athena-rs integration tests.
//!
//! # Scripted Service
//!
//! [`ScriptedService`] is a [`RemoteQueryService`] that plays back a fixed
//! script: a sequence of statuses returned by successive status polls, and a
//! list of result pages chained by continuation tokens. It records every call
//! so tests can assert on what the driver asked for.
//!
//! # Logging
//!
//! Call [`init_tracing`] at the start of a test to see driver logs. The level
//! is taken from `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=athena_rs=debug cargo test --test driver_tests -- --nocapture
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use athena_rs::driver::{BlockingConnection, Connection, Driver};
use athena_rs::error::TransportError;
use athena_rs::transport::{
    ColumnInfo, QueryState, QueryStatus, RemoteQueryService, ResultPage, Row, StatementType,
    SubmitRequest,
};
use std::sync::{Arc, Mutex};

// ============================================================================
// Constants
// ============================================================================

/// Execution id handed out by every scripted submit.
pub const QUERY_ID: &str = "scripted-query";

/// Connection string used by the helpers: fast polling, everything else default.
pub const TEST_CONNECTION_STRING: &str = "s3://test-bucket/results?poll_interval_ms=10";

// ============================================================================
// Scripted Service
// ============================================================================

#[derive(Debug, Default)]
struct Calls {
    submits: Vec<SubmitRequest>,
    status_polls: usize,
    page_tokens: Vec<Option<String>>,
    cancels: Vec<String>,
}

/// Query service replaying a fixed script.
#[derive(Debug)]
pub struct ScriptedService {
    statuses: Vec<QueryStatus>,
    pages: Vec<ResultPage>,
    submit_error: Option<TransportError>,
    calls: Mutex<Calls>,
}

impl ScriptedService {
    /// Service whose status polls return `statuses` in order, repeating the
    /// last one forever.
    pub fn new(statuses: Vec<QueryStatus>) -> Self {
        Self {
            statuses,
            pages: Vec::new(),
            submit_error: None,
            calls: Mutex::new(Calls::default()),
        }
    }

    /// Service whose queries succeed on the first poll.
    pub fn succeeding(statement_type: StatementType) -> Self {
        Self::new(vec![QueryStatus::new(QueryState::Succeeded, statement_type)])
    }

    /// Serve these pages, linking page `i` to page `i + 1` by token.
    pub fn with_pages(mut self, pages: Vec<(Vec<ColumnInfo>, Vec<Row>)>) -> Self {
        let count = pages.len();
        self.pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, (columns, rows))| {
                let next = (i + 1 < count).then(|| format!("token-{}", i + 1));
                ResultPage::new(columns, rows, next)
            })
            .collect();
        self
    }

    /// Fail every submit with `error`.
    pub fn with_submit_error(mut self, error: TransportError) -> Self {
        self.submit_error = Some(error);
        self
    }

    pub fn submits(&self) -> Vec<SubmitRequest> {
        self.calls.lock().unwrap().submits.clone()
    }

    pub fn status_polls(&self) -> usize {
        self.calls.lock().unwrap().status_polls
    }

    pub fn page_tokens(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().page_tokens.clone()
    }

    pub fn cancels(&self) -> Vec<String> {
        self.calls.lock().unwrap().cancels.clone()
    }
}

#[async_trait]
impl RemoteQueryService for ScriptedService {
    async fn submit(&self, request: &SubmitRequest) -> Result<String, TransportError> {
        self.calls.lock().unwrap().submits.push(request.clone());
        match &self.submit_error {
            Some(error) => Err(error.clone()),
            None => Ok(QUERY_ID.to_string()),
        }
    }

    async fn get_status(&self, execution_id: &str) -> Result<QueryStatus, TransportError> {
        assert_eq!(execution_id, QUERY_ID);
        let mut calls = self.calls.lock().unwrap();
        let index = calls.status_polls.min(self.statuses.len().saturating_sub(1));
        calls.status_polls += 1;
        self.statuses
            .get(index)
            .cloned()
            .ok_or_else(|| TransportError::InvalidResponse("No scripted status".to_string()))
    }

    async fn get_results_page(
        &self,
        execution_id: &str,
        page_token: Option<String>,
    ) -> Result<ResultPage, TransportError> {
        assert_eq!(execution_id, QUERY_ID);
        self.calls
            .lock()
            .unwrap()
            .page_tokens
            .push(page_token.clone());

        let index = match page_token.as_deref() {
            None => 0,
            Some(token) => token
                .strip_prefix("token-")
                .and_then(|i| i.parse::<usize>().ok())
                .ok_or_else(|| TransportError::NotFound(token.to_string()))?,
        };
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(format!("page {}", index)))
    }

    async fn cancel(&self, execution_id: &str) -> Result<(), TransportError> {
        self.calls
            .lock()
            .unwrap()
            .cancels
            .push(execution_id.to_string());
        Ok(())
    }
}

// ============================================================================
// Data Helpers
// ============================================================================

/// Columns with the given names, all typed `varchar`.
pub fn varchar_columns(names: &[&str]) -> Vec<ColumnInfo> {
    names.iter().map(|n| ColumnInfo::new(*n, "varchar")).collect()
}

/// A row of present text fields.
pub fn row(fields: &[&str]) -> Row {
    Row::from_texts(fields.iter().copied())
}

/// The header echo row the service puts at the top of a result set.
pub fn header_row(columns: &[ColumnInfo]) -> Row {
    Row::from_texts(columns.iter().map(|c| c.name.clone()))
}

/// Status in `state` for a DML statement.
pub fn dml(state: QueryState) -> QueryStatus {
    QueryStatus::new(state, StatementType::Dml)
}

// ============================================================================
// Connection Helpers
// ============================================================================

/// Connect `service` through the driver using [`TEST_CONNECTION_STRING`].
pub fn connect(service: Arc<ScriptedService>) -> Connection {
    connect_with(TEST_CONNECTION_STRING, service)
}

/// Connect `service` through the driver using `connection_string`.
pub fn connect_with(connection_string: &str, service: Arc<ScriptedService>) -> Connection {
    Driver::new()
        .open(connection_string)
        .expect("valid connection string")
        .connect(service)
}

/// Blocking connection over `service`.
pub fn connect_blocking(service: Arc<ScriptedService>) -> BlockingConnection {
    Driver::new()
        .open(TEST_CONNECTION_STRING)
        .expect("valid connection string")
        .connect_blocking(service)
        .expect("runtime starts")
}

/// Install a test-writer tracing subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

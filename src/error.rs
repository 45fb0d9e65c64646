//! Error types for athena-rs.
//!
//! This module defines domain-specific error types organized by functional area.

use thiserror::Error;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum AthenaError {
    /// Configuration and connection errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Query lifecycle errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Data conversion errors
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Remote query service errors
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors related to connection configuration.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Invalid connection parameters
    #[error("Invalid connection parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Connection string parsing error
    #[error("Failed to parse connection string: {0}")]
    ParseError(String),

    /// The blocking runtime could not be started
    #[error("Failed to start runtime: {0}")]
    RuntimeError(String),
}

/// Errors related to query execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The service rejected the submission, or the submit call failed in transit
    #[error("Query submission failed: {0}")]
    SubmissionFailed(#[source] TransportError),

    /// A status poll failed in transit (not a remote query failure)
    #[error("Polling query {query_id} failed: {source}")]
    PollFailed {
        query_id: String,
        #[source]
        source: TransportError,
    },

    /// The remote service reported the query as failed
    #[error("Query {query_id} failed: {reason}")]
    QueryFailed { query_id: String, reason: String },

    /// The query was cancelled, remotely or by the caller
    #[error("Query {query_id} was cancelled")]
    Cancelled { query_id: String },

    /// The query exceeded its time limit
    #[error("Query {query_id} timed out after {elapsed_secs}s")]
    TimedOut { query_id: String, elapsed_secs: u64 },

    /// Fetching a result page failed in transit
    #[error("Fetching results of query {query_id} failed: {source}")]
    FetchFailed {
        query_id: String,
        #[source]
        source: TransportError,
    },

    /// A row's field count does not match the column count
    #[error("Row {row} of page {page} has {actual} fields, expected {expected}")]
    ResultShape {
        page: usize,
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A caller-supplied parameter cannot be rendered as a literal
    #[error("Unsupported parameter {index}: {message}")]
    UnsupportedParameter { index: usize, message: String },

    /// Placeholders and parameters do not line up
    #[error("Parameter binding error for parameter {index}: {message}")]
    ParameterBindingError { index: usize, message: String },

    /// Statement rejected because the connection is read-only
    #[error("Connection is read-only, refusing to run: {0}")]
    ReadOnly(String),

    /// Invalid query state
    #[error("Invalid query state: {0}")]
    InvalidState(String),
}

/// Errors related to data type conversion.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Failed to convert value
    #[error("Failed to convert value at row {row}, column {column}: {message}")]
    ValueConversionFailed {
        row: usize,
        column: usize,
        message: String,
    },

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    ArrowError(String),
}

/// Errors raised by a remote query service implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The service answered with an error
    #[error("Service error ({code}): {message}")]
    ServiceError { code: String, message: String },

    /// The service is throttling requests
    #[error("Request throttled: {0}")]
    Throttled(String),

    /// Unknown execution id or page token
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid response from the service
    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    /// Message serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Network I/O error
    #[error("Network I/O error: {0}")]
    IoError(String),
}

impl QueryError {
    /// The execution id the error refers to, if any.
    pub fn query_id(&self) -> Option<&str> {
        match self {
            QueryError::PollFailed { query_id, .. }
            | QueryError::QueryFailed { query_id, .. }
            | QueryError::Cancelled { query_id }
            | QueryError::TimedOut { query_id, .. }
            | QueryError::FetchFailed { query_id, .. } => Some(query_id),
            _ => None,
        }
    }

    /// Whether the error is a terminal state of the query rather than a fault.
    pub fn is_terminal_state(&self) -> bool {
        matches!(
            self,
            QueryError::QueryFailed { .. }
                | QueryError::Cancelled { .. }
                | QueryError::TimedOut { .. }
        )
    }
}

// Conversions from external error types
impl From<arrow::error::ArrowError> for ConversionError {
    fn from(err: arrow::error::ArrowError) -> Self {
        ConversionError::ArrowError(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_invalid_parameter_display() {
        let err = ConnectionError::InvalidParameter {
            parameter: "region".to_string(),
            message: "Region cannot be empty".to_string(),
        };
        assert!(err.to_string().contains("region"));
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_submission_error_keeps_transport_source() {
        let err = QueryError::SubmissionFailed(TransportError::Throttled("slow down".into()));
        assert!(err.to_string().contains("slow down"));
        let source = err.source().unwrap();
        assert!(source.to_string().contains("throttled"));
    }

    #[test]
    fn test_poll_error_is_not_a_terminal_state() {
        let err = QueryError::PollFailed {
            query_id: "q-1".to_string(),
            source: TransportError::IoError("reset".to_string()),
        };
        assert!(!err.is_terminal_state());
        assert_eq!(err.query_id(), Some("q-1"));
    }

    #[test]
    fn test_terminal_states() {
        let failed = QueryError::QueryFailed {
            query_id: "q-2".to_string(),
            reason: "SYNTAX_ERROR".to_string(),
        };
        assert!(failed.is_terminal_state());
        assert!(failed.to_string().contains("SYNTAX_ERROR"));

        let timed_out = QueryError::TimedOut {
            query_id: "q-3".to_string(),
            elapsed_secs: 3601,
        };
        assert!(timed_out.is_terminal_state());
        assert!(timed_out.to_string().contains("3601s"));
    }

    #[test]
    fn test_result_shape_display() {
        let err = QueryError::ResultShape {
            page: 0,
            row: 5,
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("Row 5"));
        assert!(err.to_string().contains("expected 3"));
        assert!(err.query_id().is_none());
    }

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::ValueConversionFailed {
            row: 5,
            column: 2,
            message: "Invalid number format".to_string(),
        };
        assert!(err.to_string().contains("row 5"));
        assert!(err.to_string().contains("column 2"));
    }

    #[test]
    fn test_top_level_wraps_transparently() {
        let err: AthenaError = QueryError::Cancelled {
            query_id: "q-4".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Query q-4 was cancelled");
    }
}

//! Message types exchanged with the remote query service.
//!
//! Field names follow the service's JSON API (`QueryString`, `StateChangeReason`,
//! `DataScannedInBytes`, ...) so that implementations backed by an HTTP client can
//! deserialize responses straight into these types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request to start a query execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitRequest {
    /// Finished SQL text (parameters already interpolated)
    pub query_string: String,
    /// Catalog database the query runs against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Workgroup the query is billed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group: Option<String>,
    /// Location the service writes result files to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_location: Option<String>,
}

impl SubmitRequest {
    /// Create a request carrying only the query text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query_string: query.into(),
            database: None,
            work_group: None,
            output_location: None,
        }
    }

    /// Set the database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the workgroup.
    pub fn with_work_group(mut self, work_group: impl Into<String>) -> Self {
        self.work_group = Some(work_group.into());
        self
    }

    /// Set the output location.
    pub fn with_output_location(mut self, location: impl Into<String>) -> Self {
        self.output_location = Some(location.into());
        self
    }
}

/// Remote state of a query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    /// Whether no further transition can happen from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Statement classification reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementType {
    /// Schema-changing statement
    Ddl,
    /// Data-manipulating statement or query
    Dml,
    /// Administrative statement (SHOW, DESCRIBE, EXPLAIN)
    Utility,
    /// Empty or unrecognized classification
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for StatementType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

impl StatementType {
    /// Parse the service's statement type string, case-insensitively.
    ///
    /// Anything unrecognized (including the empty string) maps to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "DDL" => Self::Ddl,
            "DML" => Self::Dml,
            "UTILITY" => Self::Utility,
            _ => Self::Unknown,
        }
    }
}

/// Execution statistics reported with a status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryStatistics {
    /// Bytes read by the query, if the service reported it
    #[serde(default)]
    pub data_scanned_in_bytes: Option<i64>,
    /// Engine execution time
    #[serde(default)]
    pub engine_execution_time_in_millis: Option<i64>,
}

/// One observation of a query's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryStatus {
    pub state: QueryState,
    #[serde(default)]
    pub statement_type: StatementType,
    #[serde(default)]
    pub statistics: QueryStatistics,
    /// Diagnostic text accompanying FAILED/CANCELLED states
    #[serde(default)]
    pub state_change_reason: Option<String>,
}

impl QueryStatus {
    /// Create a status with empty statistics.
    pub fn new(state: QueryState, statement_type: StatementType) -> Self {
        Self {
            state,
            statement_type,
            statistics: QueryStatistics::default(),
            state_change_reason: None,
        }
    }

    /// Attach bytes scanned.
    pub fn with_bytes_scanned(mut self, bytes: i64) -> Self {
        self.statistics.data_scanned_in_bytes = Some(bytes);
        self
    }

    /// Attach a state change reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.state_change_reason = Some(reason.into());
        self
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    #[serde(rename = "Name")]
    pub name: String,
    /// Declared type name, e.g. `varchar`, `decimal(10,2)`, `array(integer)`
    #[serde(rename = "Type")]
    pub type_name: String,
}

impl ColumnInfo {
    /// Create column metadata.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// One result row: a textual value per column, `None` for SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Vec<Option<String>>);

impl Row {
    /// Create a row from its fields.
    pub fn new(fields: Vec<Option<String>>) -> Self {
        Self(fields)
    }

    /// Create a row where every field is non-NULL.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(texts.into_iter().map(|s| Some(s.into())).collect())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field text at `index`; `None` if out of range or NULL.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|f| f.as_deref())
    }

    /// All fields.
    pub fn fields(&self) -> &[Option<String>] {
        &self.0
    }

    /// Consume the row into its fields.
    pub fn into_fields(self) -> Vec<Option<String>> {
        self.0
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    /// Column metadata (repeated on every page by the service)
    pub columns: Vec<ColumnInfo>,
    /// Rows in this page
    pub rows: Vec<Row>,
    /// Token for the following page; `None` or empty when this is the last page
    pub next_token: Option<String>,
}

impl ResultPage {
    /// Create a page.
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Row>, next_token: Option<String>) -> Self {
        Self {
            columns,
            rows,
            next_token,
        }
    }

    /// The continuation token, treating an empty token as absent.
    pub fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|t| !t.is_empty())
    }
}

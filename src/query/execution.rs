//! Query execution lifecycle: submit, poll until terminal, then page results.
//!
//! [`ExecutionController`] drives one query through
//! `Submitting -> Polling -> {Succeeded, Failed, Cancelled, TimedOut}`.
//! Every poll iteration first checks the caller's cancellation token and
//! deadline, then observes the remote status. Terminal phases absorb: no
//! further polls happen and the execution's statistics are frozen.

use crate::error::QueryError;
use crate::query::cost::CostEstimate;
use crate::query::results::RowStream;
use crate::query::statement::StatementKind;
use crate::transport::messages::{QueryState, QueryStatistics, QueryStatus, SubmitRequest};
use crate::transport::{RemoteQueryService, StatementType};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long a DML statement may stay queued or running.
pub const DML_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Whether a still-running query has exceeded its time limit.
///
/// Only DML statements time out, and only once strictly more than
/// [`DML_TIMEOUT`] has elapsed. DDL, UTILITY and unknown statement types
/// never time out.
pub fn is_timed_out(statement_type: StatementType, elapsed: Duration) -> bool {
    statement_type == StatementType::Dml && elapsed > DML_TIMEOUT
}

/// [`is_timed_out`] over wall-clock instants. A clock that went backwards
/// counts as no time elapsed.
pub fn is_query_timed_out(
    submitted_at: SystemTime,
    now: SystemTime,
    statement_type: StatementType,
) -> bool {
    now.duration_since(submitted_at)
        .map(|elapsed| is_timed_out(statement_type, elapsed))
        .unwrap_or(false)
}

/// Local phase of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Submitting,
    Polling,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl ExecutionPhase {
    /// Whether no further transition can happen from this phase.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitting | Self::Polling)
    }

    fn from_error(err: &QueryError) -> Self {
        match err {
            QueryError::Cancelled { .. } => Self::Cancelled,
            QueryError::TimedOut { .. } => Self::TimedOut,
            _ => Self::Failed,
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitting => "SUBMITTING",
            Self::Polling => "POLLING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::TimedOut => "TIMED_OUT",
        };
        f.write_str(s)
    }
}

/// A submitted query and what has been observed about it.
#[derive(Debug, Clone)]
pub struct QueryExecution {
    id: String,
    query_text: String,
    state: QueryState,
    statement_type: StatementType,
    submitted_at: SystemTime,
    statistics: QueryStatistics,
    failure_reason: Option<String>,
    started: Instant,
}

impl QueryExecution {
    fn new(id: String, query_text: String) -> Self {
        Self {
            id,
            query_text,
            state: QueryState::Queued,
            statement_type: StatementType::Unknown,
            submitted_at: SystemTime::now(),
            statistics: QueryStatistics::default(),
            failure_reason: None,
            started: Instant::now(),
        }
    }

    /// Execution id assigned by the service.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The submitted query text.
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// Last observed remote state.
    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    pub fn submitted_at(&self) -> SystemTime {
        self.submitted_at
    }

    pub fn statistics(&self) -> &QueryStatistics {
        &self.statistics
    }

    /// Remote diagnostic text for a failed or cancelled query.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Time since submission.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Cost estimate, if the service reported bytes scanned.
    pub fn cost_estimate(&self) -> Option<CostEstimate> {
        CostEstimate::from_statistics(&self.statistics)
    }

    /// Human-readable cost line, if the service reported bytes scanned.
    pub fn cost_report(&self) -> Option<String> {
        self.cost_estimate()
            .map(|cost| format!("query {}: {}", self.id, cost))
    }

    /// Record a status observation. Ignored once the remote state is terminal.
    fn observe(&mut self, status: QueryStatus) {
        if self.state.is_terminal() {
            return;
        }
        self.state = status.state;
        self.statement_type = status.statement_type;
        self.statistics = status.statistics;
        self.failure_reason = status.state_change_reason;
    }
}

/// Settings for one execution.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Log a cost line when the query finishes
    pub report_cost: bool,
    /// Caller deadline measured from submission
    pub deadline: Option<Duration>,
    /// Caller-held cancellation signal
    pub cancel: CancellationToken,
    /// Database the query runs against
    pub database: Option<String>,
    /// Workgroup the query is billed to
    pub work_group: Option<String>,
    /// Where the service writes result files
    pub output_location: Option<String>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            report_cost: false,
            deadline: None,
            cancel: CancellationToken::new(),
            database: None,
            work_group: None,
            output_location: None,
        }
    }
}

impl ExecutionOptions {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_report_cost(mut self, report_cost: bool) -> Self {
        self.report_cost = report_cost;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn submit_request(&self, query: &str) -> SubmitRequest {
        let mut request = SubmitRequest::new(query);
        request.database = self.database.clone();
        request.work_group = self.work_group.clone();
        request.output_location = self.output_location.clone();
        request
    }
}

/// Drives one query from submission to a terminal phase.
pub struct ExecutionController {
    service: Arc<dyn RemoteQueryService>,
    options: ExecutionOptions,
    phase: ExecutionPhase,
    execution: Option<QueryExecution>,
}

impl fmt::Debug for ExecutionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionController")
            .field("options", &self.options)
            .field("phase", &self.phase)
            .field("execution", &self.execution)
            .field("service", &"<RemoteQueryService>")
            .finish()
    }
}

impl ExecutionController {
    pub fn new(service: Arc<dyn RemoteQueryService>, options: ExecutionOptions) -> Self {
        Self {
            service,
            options,
            phase: ExecutionPhase::Submitting,
            execution: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ExecutionPhase {
        self.phase
    }

    /// The execution, once submitted.
    pub fn execution(&self) -> Option<&QueryExecution> {
        self.execution.as_ref()
    }

    /// Submit `query` and poll until it reaches a terminal phase.
    ///
    /// # Errors
    /// - `QueryError::SubmissionFailed` if the submit call fails (not retried)
    /// - `QueryError::PollFailed` if a status call fails in transit
    /// - `QueryError::QueryFailed` if the service reports the query failed
    /// - `QueryError::Cancelled` if the service or the caller cancelled it
    /// - `QueryError::TimedOut` on the DML time limit or the caller deadline
    pub async fn execute(&mut self, query: &str) -> Result<&QueryExecution, QueryError> {
        if self.phase != ExecutionPhase::Submitting {
            return Err(QueryError::InvalidState(format!(
                "Execution already {}",
                self.phase
            )));
        }

        let request = self.options.submit_request(query);
        let id = match self.service.submit(&request).await {
            Ok(id) => id,
            Err(source) => {
                self.phase = ExecutionPhase::Failed;
                return Err(QueryError::SubmissionFailed(source));
            }
        };

        debug!(query_id = %id, "Query submitted");
        self.phase = ExecutionPhase::Polling;

        let mut execution = QueryExecution::new(id, query.to_string());
        let outcome = self.poll_until_terminal(&mut execution).await;

        self.phase = match &outcome {
            Ok(()) => ExecutionPhase::Succeeded,
            Err(err) => ExecutionPhase::from_error(err),
        };
        debug!(query_id = %execution.id, phase = %self.phase, "Query reached terminal phase");

        if self.options.report_cost {
            if let Some(line) = execution.cost_report() {
                info!("{}", line);
            }
        }

        let execution = self.execution.insert(execution);
        outcome.map(|()| &*execution)
    }

    /// Consume the controller into a row stream over the query's results.
    ///
    /// # Errors
    /// Returns `QueryError::InvalidState` unless the query succeeded.
    pub fn into_rows(self) -> Result<RowStream, QueryError> {
        match (self.phase, self.execution) {
            (ExecutionPhase::Succeeded, Some(execution)) => {
                let drop_header_echo =
                    StatementKind::from_sql(&execution.query_text).returns_result_set();
                Ok(RowStream::new(self.service, execution.id, drop_header_echo))
            }
            (phase, _) => Err(QueryError::InvalidState(format!(
                "Cannot fetch rows of a query in phase {}",
                phase
            ))),
        }
    }

    async fn poll_until_terminal(&self, execution: &mut QueryExecution) -> Result<(), QueryError> {
        let cancel = &self.options.cancel;

        loop {
            if cancel.is_cancelled() {
                self.cancel_remote(&execution.id).await;
                return Err(QueryError::Cancelled {
                    query_id: execution.id.clone(),
                });
            }

            if let Some(deadline) = self.options.deadline {
                if execution.elapsed() >= deadline {
                    self.cancel_remote(&execution.id).await;
                    return Err(QueryError::TimedOut {
                        query_id: execution.id.clone(),
                        elapsed_secs: execution.elapsed().as_secs(),
                    });
                }
            }

            let status = self
                .service
                .get_status(&execution.id)
                .await
                .map_err(|source| QueryError::PollFailed {
                    query_id: execution.id.clone(),
                    source,
                })?;
            execution.observe(status);

            debug!(
                query_id = %execution.id,
                state = %execution.state,
                statement_type = ?execution.statement_type,
                "Polled query status"
            );

            match execution.state {
                QueryState::Succeeded => return Ok(()),
                QueryState::Failed => {
                    let reason = execution
                        .failure_reason
                        .clone()
                        .unwrap_or_else(|| "unknown reason".to_string());
                    warn!(query_id = %execution.id, %reason, "Query failed");
                    return Err(QueryError::QueryFailed {
                        query_id: execution.id.clone(),
                        reason,
                    });
                }
                QueryState::Cancelled => {
                    return Err(QueryError::Cancelled {
                        query_id: execution.id.clone(),
                    })
                }
                QueryState::Queued | QueryState::Running => {
                    if is_timed_out(execution.statement_type, execution.elapsed()) {
                        self.cancel_remote(&execution.id).await;
                        return Err(QueryError::TimedOut {
                            query_id: execution.id.clone(),
                            elapsed_secs: execution.elapsed().as_secs(),
                        });
                    }
                }
            }

            let mut delay = self.options.poll_interval;
            if let Some(deadline) = self.options.deadline {
                delay = delay.min(deadline.saturating_sub(execution.elapsed()));
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }

    /// Ask the service to stop the query. Failure only gets logged.
    async fn cancel_remote(&self, query_id: &str) {
        if let Err(e) = self.service.cancel(query_id).await {
            warn!(query_id, error = %e, "Best-effort cancel failed");
        }
    }
}

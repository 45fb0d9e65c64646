//! In-process query service that answers every query with generated rows.
//!
//! Queries succeed on the first status poll. Result rows are built from
//! [`sample_for`](crate::types::sample_for) for each configured column (bigint
//! samples wrapped into the signed range) and
//! paged like the real service, including the header echo row at the top of
//! the first page of SELECT results.

use crate::error::TransportError;
use crate::query::StatementKind;
use crate::transport::messages::{
    ColumnInfo, QueryState, QueryStatus, ResultPage, Row, SubmitRequest,
};
use crate::transport::protocol::RemoteQueryService;
use crate::types::{sample_for, AthenaType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Largest page the service hands out.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug)]
struct SubmittedQuery {
    kind: StatementKind,
    cancelled: bool,
}

/// Network-free [`RemoteQueryService`].
#[derive(Debug)]
pub struct SyntheticQueryService {
    columns: Vec<ColumnInfo>,
    types: Vec<AthenaType>,
    rows: usize,
    page_size: usize,
    bytes_scanned: Option<i64>,
    next_id: AtomicU64,
    queries: Mutex<HashMap<String, SubmittedQuery>>,
}

impl SyntheticQueryService {
    /// Create a service returning `rows` generated rows over `columns`.
    pub fn new(columns: Vec<ColumnInfo>, rows: usize) -> Self {
        let types = columns
            .iter()
            .map(|c| AthenaType::classify(&c.type_name))
            .collect();

        Self {
            columns,
            types,
            rows,
            page_size: DEFAULT_PAGE_SIZE,
            bytes_scanned: None,
            next_id: AtomicU64::new(1),
            queries: Mutex::new(HashMap::new()),
        }
    }

    /// Set the number of generated rows per page (at least one).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Report this many bytes scanned for every query.
    pub fn with_bytes_scanned(mut self, bytes: i64) -> Self {
        self.bytes_scanned = Some(bytes);
        self
    }

    fn page_count(&self) -> usize {
        self.rows.div_ceil(self.page_size).max(1)
    }

    fn generate_row(&self) -> Row {
        Row::new(self.types.iter().map(|t| Some(generate_field(t))).collect())
    }

    fn parse_token(token: &str) -> Result<usize, TransportError> {
        token
            .parse::<usize>()
            .map_err(|_| TransportError::NotFound(format!("page token '{}'", token)))
    }
}

/// One sample for `athena_type` as the service would send it.
///
/// Service bigints are signed 64-bit, so the unsigned sample is wrapped into
/// that range.
fn generate_field(athena_type: &AthenaType) -> String {
    let sample = sample_for(athena_type);
    match athena_type {
        AthenaType::BigInt => match sample.parse::<u64>() {
            Ok(value) => (value as i64).to_string(),
            Err(_) => sample,
        },
        _ => sample,
    }
}

#[async_trait]
impl RemoteQueryService for SyntheticQueryService {
    async fn submit(&self, request: &SubmitRequest) -> Result<String, TransportError> {
        let id = format!("synthetic-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let kind = StatementKind::from_sql(&request.query_string);

        debug!(execution_id = %id, ?kind, "Synthetic query submitted");

        self.queries.lock().await.insert(
            id.clone(),
            SubmittedQuery {
                kind,
                cancelled: false,
            },
        );
        Ok(id)
    }

    async fn get_status(&self, execution_id: &str) -> Result<QueryStatus, TransportError> {
        let queries = self.queries.lock().await;
        let query = queries
            .get(execution_id)
            .ok_or_else(|| TransportError::NotFound(execution_id.to_string()))?;

        let state = if query.cancelled {
            QueryState::Cancelled
        } else {
            QueryState::Succeeded
        };

        let mut status = QueryStatus::new(state, query.kind.statement_type());
        if let Some(bytes) = self.bytes_scanned {
            status = status.with_bytes_scanned(bytes);
        }
        Ok(status)
    }

    async fn get_results_page(
        &self,
        execution_id: &str,
        page_token: Option<String>,
    ) -> Result<ResultPage, TransportError> {
        let kind = self
            .queries
            .lock()
            .await
            .get(execution_id)
            .map(|q| q.kind)
            .ok_or_else(|| TransportError::NotFound(execution_id.to_string()))?;

        let page = match page_token.as_deref() {
            None | Some("") => 0,
            Some(token) => Self::parse_token(token)?,
        };
        if page >= self.page_count() {
            return Err(TransportError::NotFound(format!("page {}", page)));
        }

        let start = page * self.page_size;
        let end = (start + self.page_size).min(self.rows);

        let mut rows = Vec::with_capacity(end - start + 1);
        if page == 0 && kind == StatementKind::Select {
            rows.push(Row::from_texts(self.columns.iter().map(|c| c.name.clone())));
        }
        rows.extend((start..end).map(|_| self.generate_row()));

        let next_token = (page + 1 < self.page_count()).then(|| (page + 1).to_string());

        Ok(ResultPage::new(self.columns.clone(), rows, next_token))
    }

    async fn cancel(&self, execution_id: &str) -> Result<(), TransportError> {
        let mut queries = self.queries.lock().await;
        let query = queries
            .get_mut(execution_id)
            .ok_or_else(|| TransportError::NotFound(execution_id.to_string()))?;
        query.cancelled = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow_conversion::ArrowConverter;
    use crate::transport::StatementType;

    fn columns() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("id", "integer"),
            ColumnInfo::new("name", "varchar"),
            ColumnInfo::new("mystery", "weird_type"),
        ]
    }

    #[tokio::test]
    async fn test_select_succeeds_with_dml_type() {
        let service = SyntheticQueryService::new(columns(), 2).with_bytes_scanned(42);
        let id = service
            .submit(&SubmitRequest::new("SELECT * FROM t"))
            .await
            .unwrap();

        let status = service.get_status(&id).await.unwrap();
        assert_eq!(status.state, QueryState::Succeeded);
        assert_eq!(status.statement_type, StatementType::Dml);
        assert_eq!(status.statistics.data_scanned_in_bytes, Some(42));
    }

    #[tokio::test]
    async fn test_statement_types() {
        let service = SyntheticQueryService::new(vec![], 0);
        for (sql, expected) in [
            ("CREATE TABLE t (a int)", StatementType::Ddl),
            ("SHOW TABLES", StatementType::Utility),
            ("INSERT INTO t VALUES (1)", StatementType::Dml),
            ("VACUUM", StatementType::Unknown),
        ] {
            let id = service.submit(&SubmitRequest::new(sql)).await.unwrap();
            let status = service.get_status(&id).await.unwrap();
            assert_eq!(status.statement_type, expected, "{}", sql);
        }
    }

    #[tokio::test]
    async fn test_paging_with_header_echo() {
        let service = SyntheticQueryService::new(columns(), 5).with_page_size(2);
        let id = service
            .submit(&SubmitRequest::new("select id from t"))
            .await
            .unwrap();

        let first = service.get_results_page(&id, None).await.unwrap();
        assert_eq!(first.rows.len(), 3);
        assert_eq!(first.rows[0], Row::from_texts(["id", "name", "mystery"]));
        assert_eq!(first.rows[1].get(2), Some("a\tb"));
        assert_eq!(first.continuation(), Some("1"));

        let second = service
            .get_results_page(&id, Some("1".to_string()))
            .await
            .unwrap();
        assert_eq!(second.rows.len(), 2);
        assert_eq!(second.continuation(), Some("2"));

        let last = service
            .get_results_page(&id, Some("2".to_string()))
            .await
            .unwrap();
        assert_eq!(last.rows.len(), 1);
        assert!(last.continuation().is_none());

        assert!(service
            .get_results_page(&id, Some("3".to_string()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_generated_values_are_typed() {
        let service = SyntheticQueryService::new(columns(), 10);
        let id = service
            .submit(&SubmitRequest::new("INSERT INTO t SELECT 1"))
            .await
            .unwrap();
        let page = service.get_results_page(&id, None).await.unwrap();

        assert_eq!(page.rows.len(), 10);
        for row in &page.rows {
            assert!(row.get(0).unwrap().parse::<i32>().is_ok());
            assert_eq!(row.get(1), Some("abc"));
        }
    }

    #[tokio::test]
    async fn test_bigint_rows_convert_to_arrow() {
        let columns = vec![ColumnInfo::new("n", "bigint")];
        let service = SyntheticQueryService::new(columns.clone(), 500);
        let id = service
            .submit(&SubmitRequest::new("INSERT INTO t SELECT 1"))
            .await
            .unwrap();
        let page = service.get_results_page(&id, None).await.unwrap();

        assert!(page
            .rows
            .iter()
            .all(|row| row.get(0).unwrap().parse::<i64>().is_ok()));

        let batch = ArrowConverter::new(&columns).convert_rows(&page.rows).unwrap();
        assert_eq!(batch.num_rows(), 500);
    }

    #[tokio::test]
    async fn test_unknown_execution() {
        let service = SyntheticQueryService::new(columns(), 1);
        assert!(matches!(
            service.get_status("nope").await,
            Err(TransportError::NotFound(_))
        ));
        assert!(service.cancel("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_marks_query_cancelled() {
        let service = SyntheticQueryService::new(columns(), 1);
        let id = service.submit(&SubmitRequest::new("SELECT 1")).await.unwrap();
        service.cancel(&id).await.unwrap();
        assert_eq!(
            service.get_status(&id).await.unwrap().state,
            QueryState::Cancelled
        );
    }
}

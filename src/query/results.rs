//! Result materialization.
//!
//! This module provides the CSV projection of result rows and the
//! [`RowStream`] cursor that pages results out of the remote service on demand.

use crate::arrow_conversion::ArrowConverter;
use crate::error::{AthenaError, QueryError};
use crate::transport::messages::{ColumnInfo, Row};
use crate::transport::RemoteQueryService;
use arrow::array::RecordBatch;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Comma-joined column names with a trailing newline; empty input gives `""`.
pub fn to_header_line(columns: &[ColumnInfo]) -> String {
    if columns.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    format!("{}\n", names.join(","))
}

/// Comma-joined field texts with a trailing newline. NULL renders as empty text.
pub fn to_data_line(row: &Row) -> String {
    let fields: Vec<&str> = row
        .fields()
        .iter()
        .map(|f| f.as_deref().unwrap_or(""))
        .collect();
    format!("{}\n", fields.join(","))
}

/// Header line followed by one data line per row.
pub fn to_full_text(columns: &[ColumnInfo], rows: &[Row]) -> String {
    let mut text = to_header_line(columns);
    for row in rows {
        text.push_str(&to_data_line(row));
    }
    text
}

/// CSV projection across a paginated stream, emitting the header exactly once.
#[derive(Debug, Default, Clone)]
pub struct CsvProjection {
    header_emitted: bool,
}

impl CsvProjection {
    /// Create a projection that has not emitted its header yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the header line has been emitted.
    pub fn header_emitted(&self) -> bool {
        self.header_emitted
    }

    /// Project one page, prefixed by the header if this is the first page.
    pub fn project_page(&mut self, columns: &[ColumnInfo], rows: &[Row]) -> String {
        if self.header_emitted {
            rows.iter().map(to_data_line).collect()
        } else {
            self.header_emitted = true;
            to_full_text(columns, rows)
        }
    }
}

/// Lazy, forward-only cursor over the rows of a succeeded query.
///
/// Pages are fetched only when the buffered rows run out. The stream cannot
/// be rewound; reading again requires running the query again.
pub struct RowStream {
    service: Arc<dyn RemoteQueryService>,
    query_id: String,
    columns: Option<Vec<ColumnInfo>>,
    converter: Option<ArrowConverter>,
    buffer: VecDeque<Row>,
    next_token: Option<String>,
    pages_fetched: usize,
    drop_header_echo: bool,
    exhausted: bool,
    closed: bool,
}

impl fmt::Debug for RowStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream")
            .field("query_id", &self.query_id)
            .field("columns", &self.columns)
            .field("buffered", &self.buffer.len())
            .field("pages_fetched", &self.pages_fetched)
            .field("exhausted", &self.exhausted)
            .field("closed", &self.closed)
            .field("service", &"<RemoteQueryService>")
            .finish()
    }
}

impl RowStream {
    /// Create a stream over the results of `query_id`.
    ///
    /// With `drop_header_echo` set, a first row equal to the column names at
    /// the top of the first page is dropped. The service adds that row to
    /// SELECT results.
    pub fn new(
        service: Arc<dyn RemoteQueryService>,
        query_id: impl Into<String>,
        drop_header_echo: bool,
    ) -> Self {
        Self {
            service,
            query_id: query_id.into(),
            columns: None,
            converter: None,
            buffer: VecDeque::new(),
            next_token: None,
            pages_fetched: 0,
            drop_header_echo,
            exhausted: false,
            closed: false,
        }
    }

    /// Execution id of the query.
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Column metadata, known once the first page has been fetched.
    pub fn columns(&self) -> Option<&[ColumnInfo]> {
        self.columns.as_deref()
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Fetch the next page, bypassing the row buffer.
    ///
    /// Returns `Ok(None)` once the last page has been read or the stream is
    /// closed. A page whose rows do not match the column count of the result
    /// set (taken from the first page) is rejected as a whole.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Row>>, QueryError> {
        if self.closed || self.exhausted {
            return Ok(None);
        }

        let page_index = self.pages_fetched;
        let page = self
            .service
            .get_results_page(&self.query_id, self.next_token.take())
            .await
            .map_err(|source| QueryError::FetchFailed {
                query_id: self.query_id.clone(),
                source,
            })?;

        let expected = self
            .columns
            .as_ref()
            .map_or(page.columns.len(), Vec::len);
        if let Some((row, bad)) = page.rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            self.exhausted = true;
            return Err(QueryError::ResultShape {
                page: page_index,
                row,
                expected,
                actual: bad.len(),
            });
        }

        self.pages_fetched += 1;
        match page.continuation() {
            Some(token) => self.next_token = Some(token.to_string()),
            None => self.exhausted = true,
        }

        let mut rows = page.rows;
        if page_index == 0 && self.drop_header_echo && is_header_echo(rows.first(), &page.columns) {
            rows.remove(0);
        }

        debug!(
            query_id = %self.query_id,
            page = page_index,
            rows = rows.len(),
            last = self.exhausted,
            "Fetched result page"
        );

        if self.columns.is_none() {
            self.converter = Some(ArrowConverter::new(&page.columns));
            self.columns = Some(page.columns);
        }

        Ok(Some(rows))
    }

    /// Next row, fetching a page if the buffer is empty.
    pub async fn next_row(&mut self) -> Result<Option<Row>, QueryError> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                return Ok(Some(row));
            }
            match self.next_page().await? {
                Some(rows) => self.buffer.extend(rows),
                None => return Ok(None),
            }
        }
    }

    /// Next chunk of rows as an Arrow RecordBatch.
    ///
    /// Buffered rows are returned first; otherwise one page is fetched.
    /// Empty pages in the middle of a result are skipped.
    pub async fn next_batch(&mut self) -> Result<Option<RecordBatch>, AthenaError> {
        let rows: Vec<Row> = if self.buffer.is_empty() {
            loop {
                match self.next_page().await? {
                    Some(rows) if rows.is_empty() && !self.exhausted => continue,
                    Some(rows) => break rows,
                    None => return Ok(None),
                }
            }
        } else {
            self.buffer.drain(..).collect()
        };

        let converter = self
            .converter
            .as_ref()
            .ok_or_else(|| QueryError::InvalidState("No column metadata".to_string()))?;
        Ok(Some(converter.convert_rows(&rows)?))
    }

    /// Read all remaining rows into memory.
    pub async fn collect_rows(mut self) -> Result<Vec<Row>, QueryError> {
        let mut rows: Vec<Row> = self.buffer.drain(..).collect();
        while let Some(page) = self.next_page().await? {
            rows.extend(page);
        }
        Ok(rows)
    }

    /// Read all remaining rows as CSV text: the header once, then one line per row.
    ///
    /// The header is emitted whenever column metadata is available, even if
    /// there are no rows.
    pub async fn collect_csv(mut self) -> Result<String, QueryError> {
        let mut projection = CsvProjection::new();
        let mut text = String::new();

        if !self.buffer.is_empty() {
            let rows: Vec<Row> = self.buffer.drain(..).collect();
            let columns = self.columns.clone().unwrap_or_default();
            text.push_str(&projection.project_page(&columns, &rows));
        }

        while let Some(rows) = self.next_page().await? {
            let columns = self.columns.as_deref().unwrap_or_default();
            text.push_str(&projection.project_page(columns, &rows));
        }

        Ok(text)
    }

    /// Release buffered rows and paging state. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.closed {
            debug!(query_id = %self.query_id, "Closing row stream");
        }
        self.closed = true;
        self.buffer.clear();
        self.next_token = None;
    }
}

fn is_header_echo(first: Option<&Row>, columns: &[ColumnInfo]) -> bool {
    first.is_some_and(|row| {
        row.len() == columns.len()
            && row
                .fields()
                .iter()
                .zip(columns)
                .all(|(field, col)| field.as_deref() == Some(col.name.as_str()))
    })
}

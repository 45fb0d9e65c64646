//! Main converter for transforming result pages into Arrow RecordBatches.
//!
//! Rows arrive row-major as optional texts; the converter checks their arity,
//! transposes them to columns and builds one typed array per column.

use crate::error::ConversionError;
use crate::transport::messages::{ColumnInfo, Row};
use crate::types::{AthenaType, TypeMapper};
use arrow::array::RecordBatch;
use arrow::datatypes::{Field, Schema};
use std::sync::Arc;

use super::builders::build_array;

/// Converter for transforming result rows to Arrow RecordBatch.
#[derive(Debug, Clone)]
pub struct ArrowConverter {
    schema: Arc<Schema>,
    column_types: Vec<AthenaType>,
}

impl ArrowConverter {
    /// Create a new Arrow converter from column metadata.
    ///
    /// Every column is nullable. Column types are classified totally, so this
    /// never fails for unrecognized type names.
    pub fn new(columns: &[ColumnInfo]) -> Self {
        let column_types: Vec<AthenaType> = columns
            .iter()
            .map(|col| AthenaType::classify(&col.type_name))
            .collect();

        let fields: Vec<Field> = columns
            .iter()
            .zip(&column_types)
            .map(|(col, ty)| Field::new(&col.name, TypeMapper::athena_to_arrow(ty), true))
            .collect();

        Self {
            schema: Arc::new(Schema::new(fields)),
            column_types,
        }
    }

    /// Get the Arrow schema for this converter.
    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Classified column types, in column order.
    pub fn column_types(&self) -> &[AthenaType] {
        &self.column_types
    }

    /// Convert rows to an Arrow RecordBatch.
    ///
    /// # Errors
    /// Returns `ConversionError` if:
    /// - A row's field count differs from the column count
    /// - A value is not valid for its column type
    pub fn convert_rows(&self, rows: &[Row]) -> Result<RecordBatch, ConversionError> {
        if rows.is_empty() {
            return Ok(RecordBatch::new_empty(Arc::clone(&self.schema)));
        }

        // Verify row structure matches schema
        let num_columns = self.column_types.len();
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != num_columns {
                return Err(ConversionError::SchemaMismatch(format!(
                    "Row {} has {} columns, expected {}",
                    row_idx,
                    row.len(),
                    num_columns
                )));
            }
        }

        let columns_data = transpose_rows_to_columns(rows, num_columns);

        let arrays: Result<Vec<_>, _> = self
            .column_types
            .iter()
            .enumerate()
            .map(|(col_idx, ty)| build_array(ty, &columns_data[col_idx], col_idx))
            .collect();

        RecordBatch::try_new(Arc::clone(&self.schema), arrays?)
            .map_err(|e| ConversionError::ArrowError(e.to_string()))
    }
}

/// Transpose row-major data to column-major, borrowing the field texts.
fn transpose_rows_to_columns(rows: &[Row], num_columns: usize) -> Vec<Vec<Option<&str>>> {
    let mut columns: Vec<Vec<Option<&str>>> = (0..num_columns)
        .map(|_| Vec::with_capacity(rows.len()))
        .collect();

    for row in rows {
        for (col_idx, field) in row.fields().iter().enumerate() {
            columns[col_idx].push(field.as_deref());
        }
    }

    columns
}

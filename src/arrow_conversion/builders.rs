//! Array builders for converting textual column values to Arrow arrays.
//!
//! Each builder decodes values through [`TypeMapper::convert`] so that typed
//! arrays and typed field values agree on what counts as valid input.

use crate::error::ConversionError;
use crate::types::{AthenaType, FieldValue, TypeMapper};
use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Date32Builder, Float32Builder, Float64Builder,
    Int16Builder, Int32Builder, Int64Builder, Int8Builder, StringBuilder,
    Time64MicrosecondBuilder, TimestampMicrosecondBuilder,
};
use arrow::datatypes::DataType;
use std::sync::Arc;

/// Build an Arrow array from one column of field texts.
///
/// # Arguments
/// * `athena_type` - The column type
/// * `values` - Column of field texts (one per row, `None` for NULL)
/// * `column` - Column index for error reporting
pub fn build_array(
    athena_type: &AthenaType,
    values: &[Option<&str>],
    column: usize,
) -> Result<ArrayRef, ConversionError> {
    match TypeMapper::athena_to_arrow(athena_type) {
        DataType::Int8 => {
            let mut builder = Int8Builder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::TinyInt(i) => builder.append_value(i),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int16 => {
            let mut builder = Int16Builder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::SmallInt(i) => builder.append_value(i),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int32 => {
            let mut builder = Int32Builder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::Integer(i) => builder.append_value(i),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::BigInt(i) => builder.append_value(i),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Float32 => {
            let mut builder = Float32Builder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::Real(f) => builder.append_value(f),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::Double(f) => builder.append_value(f),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::Boolean(b) => builder.append_value(b),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Date32 => {
            let mut builder = Date32Builder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::Date(days) => builder.append_value(days),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Time64(_) => {
            let mut builder = Time64MicrosecondBuilder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::Time { micros, .. } => builder.append_value(micros),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Timestamp(_, _) => {
            let mut builder = TimestampMicrosecondBuilder::with_capacity(values.len());
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::Timestamp { micros, .. } => builder.append_value(micros),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        DataType::Binary => {
            let mut builder = BinaryBuilder::with_capacity(values.len(), values.len() * 16);
            decode_into(athena_type, values, column, |v| match v {
                FieldValue::Binary(bytes) => builder.append_value(bytes),
                _ => builder.append_null(),
            })?;
            Ok(Arc::new(builder.finish()))
        }
        _ => Ok(build_string_array(values)),
    }
}

/// Decode every value and hand it to `append`, stopping at the first failure.
fn decode_into<F>(
    athena_type: &AthenaType,
    values: &[Option<&str>],
    column: usize,
    mut append: F,
) -> Result<(), ConversionError>
where
    F: FnMut(FieldValue),
{
    for (row, value) in values.iter().enumerate() {
        append(TypeMapper::convert(athena_type, *value, row, column)?);
    }
    Ok(())
}

/// Estimate total string bytes for capacity pre-allocation.
/// Uses a sample of the first few non-null values.
fn estimate_string_capacity(values: &[Option<&str>]) -> usize {
    const SAMPLE_SIZE: usize = 10;
    const DEFAULT_AVG_LEN: usize = 32;

    let sample: Vec<usize> = values
        .iter()
        .take(SAMPLE_SIZE)
        .filter_map(|v| v.map(str::len))
        .collect();

    if sample.is_empty() {
        DEFAULT_AVG_LEN * values.len()
    } else {
        let avg_len = sample.iter().sum::<usize>() / sample.len();
        (avg_len + 8) * values.len()
    }
}

/// Build a String array from the raw texts, preserving them unchanged.
fn build_string_array(values: &[Option<&str>]) -> ArrayRef {
    let mut builder = StringBuilder::with_capacity(values.len(), estimate_string_capacity(values));
    for value in values {
        builder.append_option(*value);
    }
    Arc::new(builder.finish())
}

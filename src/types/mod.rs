//! Type mapping between service column types, driver values and Arrow data types.

mod mapping;
mod sample;

pub use mapping::{AthenaType, FieldValue, TypeMapper};
pub use sample::{sample_for, sample_value, FALLBACK_SAMPLE};

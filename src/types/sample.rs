//! Synthetic values for column types.
//!
//! Used by the synthetic query service to build rows without a live query.
//! Numeric types get a random value over their full range; every other type
//! gets a fixed literal that is valid for it.

use super::mapping::AthenaType;
use rand::Rng;

/// Literal used for unrecognized types.
pub const FALLBACK_SAMPLE: &str = "a\tb";

/// Produce one textual sample value for a declared type name.
pub fn sample_value(type_name: &str) -> String {
    sample_for(&AthenaType::classify(type_name))
}

/// Produce one textual sample value for a classified type.
pub fn sample_for(athena_type: &AthenaType) -> String {
    let mut rng = rand::rng();

    match athena_type {
        AthenaType::TinyInt => rng.random::<i8>().to_string(),
        AthenaType::SmallInt => rng.random::<i16>().to_string(),
        AthenaType::Integer => rng.random::<i32>().to_string(),
        // Drawn over the full unsigned range; the text is what the service would send
        AthenaType::BigInt => rng.random::<u64>().to_string(),
        AthenaType::Real => {
            let value = (rng.random::<f32>() * f32::MAX).max(f32::MIN_POSITIVE);
            value.to_string()
        }
        AthenaType::Double => {
            let value = (rng.random::<f64>() * f64::MAX).max(f64::MIN_POSITIVE);
            value.to_string()
        }
        other => fixed_sample(other).to_string(),
    }
}

fn fixed_sample(athena_type: &AthenaType) -> &'static str {
    match athena_type {
        AthenaType::Decimal => "0.1",
        AthenaType::Boolean => "true",
        AthenaType::Date => "2020-01-01",
        AthenaType::Time {
            with_time_zone: false,
        } => "00:00:00.000",
        AthenaType::Time {
            with_time_zone: true,
        } => "00:00:00.000 UTC",
        AthenaType::Timestamp {
            with_time_zone: false,
        } => "2020-01-01 00:00:00.000",
        AthenaType::Timestamp {
            with_time_zone: true,
        } => "2020-01-01 00:00:00.000 UTC",
        AthenaType::Varchar | AthenaType::Char => "abc",
        AthenaType::Json => "{}",
        AthenaType::IpAddress => "127.0.0.1",
        AthenaType::Varbinary => "61 62 63",
        AthenaType::Array => "[]",
        AthenaType::Map => "{}",
        AthenaType::Row => "{}",
        AthenaType::IntervalYearToMonth => "0-1",
        AthenaType::IntervalDayToSecond => "0 00:00:01.000",
        AthenaType::Geometry => "POINT (0 0)",
        _ => FALLBACK_SAMPLE,
    }
}

//! Type mapping between service column types, driver values and Apache Arrow.
//!
//! The service reports every column with a free-form type name and every value
//! as text. `AthenaType::classify` turns the name into a closed set of
//! categories (with an `Unknown` arm so new service types never break a
//! query), and `TypeMapper::convert` decodes a field's text into a typed
//! `FieldValue`.

use crate::error::ConversionError;
use arrow::datatypes::{DataType, TimeUnit};
use std::fmt;

/// Column type categories understood by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AthenaType {
    /// TINYINT, signed 8-bit
    TinyInt,
    /// SMALLINT, signed 16-bit
    SmallInt,
    /// INTEGER / INT, signed 32-bit
    Integer,
    /// BIGINT, signed 64-bit
    BigInt,
    /// REAL / FLOAT, IEEE 754 single precision
    Real,
    /// DOUBLE, IEEE 754 double precision
    Double,
    /// DECIMAL(p, s), kept as text to preserve precision
    Decimal,
    /// BOOLEAN
    Boolean,
    /// DATE
    Date,
    /// TIME [WITH TIME ZONE]
    Time { with_time_zone: bool },
    /// TIMESTAMP [WITH TIME ZONE]
    Timestamp { with_time_zone: bool },
    /// VARCHAR / STRING
    Varchar,
    /// CHAR(n)
    Char,
    /// JSON
    Json,
    /// IPADDRESS
    IpAddress,
    /// VARBINARY / BINARY
    Varbinary,
    /// ARRAY(T)
    Array,
    /// MAP(K, V)
    Map,
    /// ROW(...) / STRUCT<...>
    Row,
    /// INTERVAL YEAR TO MONTH
    IntervalYearToMonth,
    /// INTERVAL DAY TO SECOND
    IntervalDayToSecond,
    /// GEOMETRY / SPHERICALGEOGRAPHY (well-known text)
    Geometry,
    /// Anything else, carrying the declared name
    Unknown(String),
}

impl AthenaType {
    /// Classify a declared type name.
    ///
    /// Matching is case-insensitive and ignores type parameters, so
    /// `DECIMAL(10,2)`, `varchar(255)`, `array(integer)`, `struct<a:int>` and
    /// `timestamp(3) with time zone` all classify by their base name. This
    /// never fails: unrecognized names become `Unknown`.
    pub fn classify(type_name: &str) -> Self {
        let base = base_type_name(type_name);

        match base.as_str() {
            "tinyint" => Self::TinyInt,
            "smallint" => Self::SmallInt,
            "integer" | "int" => Self::Integer,
            "bigint" => Self::BigInt,
            "real" | "float" => Self::Real,
            "double" | "double precision" => Self::Double,
            "decimal" | "numeric" => Self::Decimal,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "time" => Self::Time {
                with_time_zone: false,
            },
            "time with time zone" => Self::Time {
                with_time_zone: true,
            },
            "timestamp" => Self::Timestamp {
                with_time_zone: false,
            },
            "timestamp with time zone" => Self::Timestamp {
                with_time_zone: true,
            },
            "varchar" | "string" => Self::Varchar,
            "char" => Self::Char,
            "json" => Self::Json,
            "ipaddress" => Self::IpAddress,
            "varbinary" | "binary" => Self::Varbinary,
            "array" => Self::Array,
            "map" => Self::Map,
            "row" | "struct" => Self::Row,
            "interval year to month" => Self::IntervalYearToMonth,
            "interval day to second" => Self::IntervalDayToSecond,
            "geometry" | "sphericalgeography" => Self::Geometry,
            _ => Self::Unknown(type_name.to_string()),
        }
    }

    /// Whether values of this type are delivered as text without decoding.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Self::Decimal
                | Self::Varchar
                | Self::Char
                | Self::Json
                | Self::IpAddress
                | Self::Array
                | Self::Map
                | Self::Row
                | Self::IntervalYearToMonth
                | Self::IntervalDayToSecond
                | Self::Geometry
                | Self::Unknown(_)
        )
    }
}

impl fmt::Display for AthenaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TinyInt => "tinyint",
            Self::SmallInt => "smallint",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Real => "real",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time {
                with_time_zone: false,
            } => "time",
            Self::Time {
                with_time_zone: true,
            } => "time with time zone",
            Self::Timestamp {
                with_time_zone: false,
            } => "timestamp",
            Self::Timestamp {
                with_time_zone: true,
            } => "timestamp with time zone",
            Self::Varchar => "varchar",
            Self::Char => "char",
            Self::Json => "json",
            Self::IpAddress => "ipaddress",
            Self::Varbinary => "varbinary",
            Self::Array => "array",
            Self::Map => "map",
            Self::Row => "row",
            Self::IntervalYearToMonth => "interval year to month",
            Self::IntervalDayToSecond => "interval day to second",
            Self::Geometry => "geometry",
            Self::Unknown(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// Lowercase the name, drop `(...)` and `<...>` parameter groups and collapse whitespace.
fn base_type_name(type_name: &str) -> String {
    let mut stripped = String::with_capacity(type_name.len());
    let mut depth = 0usize;

    for c in type_name.chars() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Boolean(bool),
    /// Days since 1970-01-01
    Date(i32),
    /// Microseconds since midnight, with the zone suffix if the column carries one
    Time { micros: i64, zone: Option<String> },
    /// Microseconds since the Unix epoch, with the zone suffix if the column carries one
    Timestamp { micros: i64, zone: Option<String> },
    Binary(Vec<u8>),
    /// Decimal, textual, composite, interval and unknown values
    Text(String),
}

impl FieldValue {
    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Type mapper for decoding values and mapping columns to Arrow.
pub struct TypeMapper;

impl TypeMapper {
    /// Decode one field.
    ///
    /// # Arguments
    /// * `athena_type` - Classified column type
    /// * `text` - Field text, `None` for NULL
    /// * `row`, `column` - Position, used in error messages
    ///
    /// # Errors
    /// Returns `ConversionError::ValueConversionFailed` if the text is not a valid
    /// value of a decoded type. Textual types never fail.
    pub fn convert(
        athena_type: &AthenaType,
        text: Option<&str>,
        row: usize,
        column: usize,
    ) -> Result<FieldValue, ConversionError> {
        let Some(text) = text else {
            return Ok(FieldValue::Null);
        };

        let invalid = |what: &str| ConversionError::ValueConversionFailed {
            row,
            column,
            message: format!("Invalid {} value: {}", what, text),
        };

        match athena_type {
            AthenaType::TinyInt => text
                .trim()
                .parse()
                .map(FieldValue::TinyInt)
                .map_err(|_| invalid("tinyint")),
            AthenaType::SmallInt => text
                .trim()
                .parse()
                .map(FieldValue::SmallInt)
                .map_err(|_| invalid("smallint")),
            AthenaType::Integer => text
                .trim()
                .parse()
                .map(FieldValue::Integer)
                .map_err(|_| invalid("integer")),
            AthenaType::BigInt => text
                .trim()
                .parse()
                .map(FieldValue::BigInt)
                .map_err(|_| invalid("bigint")),
            AthenaType::Real => parse_float(text)
                .map(|f| FieldValue::Real(f as f32))
                .ok_or_else(|| invalid("real")),
            AthenaType::Double => parse_float(text)
                .map(FieldValue::Double)
                .ok_or_else(|| invalid("double")),
            AthenaType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "f" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(invalid("boolean")),
            },
            AthenaType::Date => parse_date_to_days(text.trim())
                .map(FieldValue::Date)
                .ok_or_else(|| invalid("date")),
            AthenaType::Time { with_time_zone } => {
                let (clock, zone) = split_zone(text.trim(), *with_time_zone);
                parse_time_to_micros(clock)
                    .map(|micros| FieldValue::Time { micros, zone })
                    .ok_or_else(|| invalid("time"))
            }
            AthenaType::Timestamp { with_time_zone } => {
                let trimmed = text.trim();
                let (datetime, zone) = if *with_time_zone {
                    // "2020-01-01 10:00:00.000 UTC": the zone follows the second space
                    match trimmed.match_indices(' ').nth(1) {
                        Some((pos, _)) => (
                            &trimmed[..pos],
                            Some(trimmed[pos + 1..].trim().to_string()),
                        ),
                        None => (trimmed, None),
                    }
                } else {
                    (trimmed, None)
                };
                parse_timestamp_to_micros(datetime)
                    .map(|micros| FieldValue::Timestamp { micros, zone })
                    .ok_or_else(|| invalid("timestamp"))
            }
            AthenaType::Varbinary => decode_hex(text)
                .map(FieldValue::Binary)
                .ok_or_else(|| invalid("varbinary")),
            _ => Ok(FieldValue::Text(text.to_string())),
        }
    }

    /// Convert a column type to an Arrow DataType.
    ///
    /// Decimal is mapped to `Utf8` so the service's exact text survives.
    pub fn athena_to_arrow(athena_type: &AthenaType) -> DataType {
        match athena_type {
            AthenaType::TinyInt => DataType::Int8,
            AthenaType::SmallInt => DataType::Int16,
            AthenaType::Integer => DataType::Int32,
            AthenaType::BigInt => DataType::Int64,
            AthenaType::Real => DataType::Float32,
            AthenaType::Double => DataType::Float64,
            AthenaType::Boolean => DataType::Boolean,
            AthenaType::Date => DataType::Date32,
            AthenaType::Time {
                with_time_zone: false,
            } => DataType::Time64(TimeUnit::Microsecond),
            AthenaType::Timestamp {
                with_time_zone: false,
            } => DataType::Timestamp(TimeUnit::Microsecond, None),
            AthenaType::Varbinary => DataType::Binary,
            // Zoned values carry a per-row zone name, which Arrow cannot store per value
            _ => DataType::Utf8,
        }
    }
}

/// Parse a float, accepting the service's spellings of the special values.
fn parse_float(text: &str) -> Option<f64> {
    match text.trim() {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        s => s.parse().ok(),
    }
}

/// Split a trailing zone name off a time value when the column is zoned.
fn split_zone(text: &str, with_time_zone: bool) -> (&str, Option<String>) {
    if !with_time_zone {
        return (text, None);
    }
    match text.split_once(' ') {
        Some((clock, zone)) => (clock, Some(zone.trim().to_string())),
        None => (text, None),
    }
}

/// Days from 1970-01-01 to the given civil date (proleptic Gregorian).
pub(crate) fn days_from_civil(year: i32, month: u32, day: u32) -> i32 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let m = month as i32;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i32 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Parse "YYYY-MM-DD" to days since the Unix epoch.
pub(crate) fn parse_date_to_days(date_str: &str) -> Option<i32> {
    let mut parts = date_str.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;

    let is_leap_year = (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0);
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year => 29,
        2 => 28,
        _ => return None,
    };
    if day == 0 || day > days_in_month {
        return None;
    }

    Some(days_from_civil(year, month, day))
}

/// Parse "HH:MM[:SS[.fff...]]" to microseconds since midnight.
pub(crate) fn parse_time_to_micros(time_str: &str) -> Option<i64> {
    let mut parts = time_str.splitn(3, ':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    let mut micros = (hours * 3600 + minutes * 60) * 1_000_000;

    if let Some(seconds) = parts.next() {
        let (whole, frac) = match seconds.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (seconds, ""),
        };
        let whole: i64 = whole.parse().ok()?;
        if !(0..60).contains(&whole) {
            return None;
        }
        micros += whole * 1_000_000;

        if !frac.is_empty() {
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // Truncate beyond microseconds, pad below
            let digits: String = frac.chars().chain("000000".chars()).take(6).collect();
            micros += digits.parse::<i64>().ok()?;
        }
    }

    Some(micros)
}

/// Parse "YYYY-MM-DD[ HH:MM:SS.fff]" to microseconds since the Unix epoch.
pub(crate) fn parse_timestamp_to_micros(timestamp_str: &str) -> Option<i64> {
    let (date, time) = match timestamp_str.split_once([' ', 'T']) {
        Some((date, time)) => (date, Some(time)),
        None => (timestamp_str, None),
    };

    let days = parse_date_to_days(date)? as i64;
    let time_micros = match time {
        Some(t) => parse_time_to_micros(t)?,
        None => 0,
    };

    Some(days * 86_400 * 1_000_000 + time_micros)
}

/// Decode the service's varbinary text: hex digits, optionally space separated.
fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact).ok()
}

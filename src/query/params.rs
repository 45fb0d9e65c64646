//! Parameter values and client-side placeholder interpolation.
//!
//! The remote service has no bind-parameter mechanism, so parameters are
//! rendered as SQL literals and inlined into the query text before submission.
//! Placeholders are `?` (positional) and `:name` (named). Placeholders inside
//! quoted strings, quoted identifiers and comments are left alone, and `::`
//! casts are not placeholders.

use crate::error::QueryError;
use crate::query::escape::escape_str_backslash;

/// Parameter value for client-side interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Signed integer value
    Integer(i64),
    /// Unsigned integer value
    UnsignedInteger(u64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Binary data
    Binary(Vec<u8>),
    /// JSON document
    Json(serde_json::Value),
}

impl Value {
    /// Render the value as a SQL literal.
    ///
    /// # Errors
    /// Returns `QueryError::UnsupportedParameter` for NaN and infinite floats,
    /// which have no literal form.
    pub fn to_sql_literal(&self) -> Result<String, QueryError> {
        match self {
            Value::Null => Ok("NULL".to_string()),
            Value::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::UnsignedInteger(u) => Ok(u.to_string()),
            Value::Float(f) => {
                if f.is_finite() {
                    // Debug keeps a fractional part or exponent, so the literal stays a double
                    Ok(format!("{:?}", f))
                } else {
                    Err(QueryError::UnsupportedParameter {
                        index: 0,
                        message: format!("{} has no SQL literal form", f),
                    })
                }
            }
            Value::String(s) => Ok(quote(s)),
            Value::Binary(b) => Ok(format!("X'{}'", hex::encode_upper(b))),
            Value::Json(j) => Ok(format!("JSON {}", quote(&j.to_string()))),
        }
    }
}

fn quote(s: &str) -> String {
    let mut literal = String::with_capacity(s.len() + 2);
    literal.push('\'');
    escape_str_backslash(&mut literal, s);
    literal.push('\'');
    literal
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UnsignedInteger(value as u64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UnsignedInteger(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Binary(value.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A parameter with an optional name and a 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue<V = Value> {
    /// Name used by `:name` placeholders
    pub name: Option<String>,
    /// 1-based position used by `?` placeholders
    pub ordinal: usize,
    /// The value itself
    pub value: V,
}

impl<V> NamedValue<V> {
    /// Create a positional parameter.
    pub fn positional(ordinal: usize, value: V) -> Self {
        Self {
            name: None,
            ordinal,
            value,
        }
    }

    /// Create a named parameter. The ordinal is kept for positional lookups.
    pub fn named(name: impl Into<String>, ordinal: usize, value: V) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value,
        }
    }
}

/// Wrap values as positional parameters with ordinals 1..=N in input order.
pub fn named_values_from_values<V>(values: impl IntoIterator<Item = V>) -> Vec<NamedValue<V>> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| NamedValue::positional(i + 1, value))
        .collect()
}

/// Strip names and ordinals, keeping values in input order.
pub fn values_from_named_values<V>(named: impl IntoIterator<Item = NamedValue<V>>) -> Vec<V> {
    named.into_iter().map(|nv| nv.value).collect()
}

#[derive(Debug, PartialEq)]
enum Placeholder<'a> {
    Positional,
    Named(&'a str),
}

/// Substitute placeholders in `template` with literals rendered from `params`.
///
/// `?` placeholders take parameters in ordinal order; `:name` placeholders
/// look parameters up by name. A template must not mix both styles.
///
/// A `:` directly after an identifier is not a placeholder, so type syntax
/// such as `struct<a:int>` passes through unchanged.
///
/// # Errors
/// - `QueryError::ParameterBindingError` if the number of `?` placeholders
///   differs from the number of parameters (a template without placeholders
///   takes none), a name has no parameter, or both placeholder styles appear.
/// - `QueryError::UnsupportedParameter` if a value has no literal form.
pub fn interpolate(template: &str, params: &[NamedValue]) -> Result<String, QueryError> {
    let mut positional: Vec<&NamedValue> = params.iter().collect();
    positional.sort_by_key(|p| p.ordinal);

    let mut out = String::with_capacity(template.len());
    let mut next_positional = 0;
    let mut saw_named = false;

    scan(template, |segment| {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder(Placeholder::Positional) => {
                if saw_named {
                    return Err(mixed_styles(next_positional));
                }
                let index = next_positional;
                let param = positional.get(index).ok_or_else(|| {
                    QueryError::ParameterBindingError {
                        index,
                        message: format!(
                            "Not enough parameters: placeholder {} but {} supplied",
                            index + 1,
                            params.len()
                        ),
                    }
                })?;
                out.push_str(&render(param, index)?);
                next_positional += 1;
            }
            Segment::Placeholder(Placeholder::Named(name)) => {
                if next_positional > 0 {
                    return Err(mixed_styles(next_positional));
                }
                saw_named = true;
                let (index, param) = params
                    .iter()
                    .enumerate()
                    .find(|(_, p)| p.name.as_deref() == Some(name))
                    .ok_or_else(|| QueryError::ParameterBindingError {
                        index: 0,
                        message: format!("No parameter named '{}'", name),
                    })?;
                out.push_str(&render(param, index)?);
            }
        }
        Ok(())
    })?;

    if !saw_named && next_positional != params.len() {
        return Err(QueryError::ParameterBindingError {
            index: next_positional,
            message: format!(
                "Too many parameters: {} placeholders but {} supplied",
                next_positional,
                params.len()
            ),
        });
    }

    Ok(out)
}

/// Count the placeholders in `template`.
pub fn placeholder_count(template: &str) -> usize {
    let mut count = 0;
    let _ = scan(template, |segment| {
        if let Segment::Placeholder(_) = segment {
            count += 1;
        }
        Ok(())
    });
    count
}

fn render(param: &NamedValue, index: usize) -> Result<String, QueryError> {
    param.value.to_sql_literal().map_err(|e| match e {
        QueryError::UnsupportedParameter { message, .. } => {
            QueryError::UnsupportedParameter { index, message }
        }
        other => other,
    })
}

fn mixed_styles(index: usize) -> QueryError {
    QueryError::ParameterBindingError {
        index,
        message: "Cannot mix '?' and ':name' placeholders".to_string(),
    }
}

enum Segment<'a> {
    Text(&'a str),
    Placeholder(Placeholder<'a>),
}

/// Split `sql` into literal text and placeholders, feeding each to `visit`.
fn scan<'a, F>(sql: &'a str, mut visit: F) -> Result<(), QueryError>
where
    F: FnMut(Segment<'a>) -> Result<(), QueryError>,
{
    let bytes = sql.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => i = skip_quoted(bytes, i, quote),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |p| i + p + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2);
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes.get(i + 1).is_some_and(|&b| is_name_start(b))
                && (i == 0 || !is_name_char(bytes[i - 1])) =>
            {
                let end = bytes[i + 1..]
                    .iter()
                    .position(|&b| !is_name_char(b))
                    .map_or(bytes.len(), |p| i + 1 + p);
                visit(Segment::Text(&sql[start..i]))?;
                visit(Segment::Placeholder(Placeholder::Named(&sql[i + 1..end])))?;
                start = end;
                i = end;
            }
            b'?' => {
                visit(Segment::Text(&sql[start..i]))?;
                visit(Segment::Placeholder(Placeholder::Positional))?;
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    visit(Segment::Text(&sql[start..]))
}

/// Index just past the closing quote of the region opened at `open`.
///
/// A doubled quote or a backslash escape does not close the region.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'\'' => i += 2,
            b if b == quote => {
                if bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                } else {
                    return i + 1;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literals() {
        assert_eq!(Value::Null.to_sql_literal().unwrap(), "NULL");
        assert_eq!(Value::from(true).to_sql_literal().unwrap(), "TRUE");
        assert_eq!(Value::from(false).to_sql_literal().unwrap(), "FALSE");
        assert_eq!(Value::from(-42).to_sql_literal().unwrap(), "-42");
        assert_eq!(Value::from(u64::MAX).to_sql_literal().unwrap(), u64::MAX.to_string());
        assert_eq!(Value::from(2.0).to_sql_literal().unwrap(), "2.0");
        assert_eq!(Value::from(1.5).to_sql_literal().unwrap(), "1.5");
        assert_eq!(Value::from("abc").to_sql_literal().unwrap(), "'abc'");
        assert_eq!(
            Value::from(vec![0xde, 0xad]).to_sql_literal().unwrap(),
            "X'DEAD'"
        );
        assert_eq!(Value::from(None::<i64>).to_sql_literal().unwrap(), "NULL");
    }

    #[test]
    fn test_string_literal_is_escaped() {
        assert_eq!(
            Value::from("O'Reilly\n\\").to_sql_literal().unwrap(),
            r"'O\'Reilly\n\\'"
        );
        assert_eq!(
            Value::from("x'; DROP TABLE t; --").to_sql_literal().unwrap(),
            r"'x\'; DROP TABLE t; --'"
        );
    }

    #[test]
    fn test_json_literal() {
        let value = Value::from(json!({"k": "it's"}));
        assert_eq!(value.to_sql_literal().unwrap(), r#"JSON '{\"k\":\"it\'s\"}'"#);
    }

    #[test]
    fn test_non_finite_float_unsupported() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                Value::Float(f).to_sql_literal(),
                Err(QueryError::UnsupportedParameter { .. })
            ));
        }
    }

    #[test]
    fn test_named_values_from_values() {
        let named = named_values_from_values(vec!["a", "b", "c"]);
        let ordinals: Vec<usize> = named.iter().map(|n| n.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert!(named.iter().all(|n| n.name.is_none()));
        assert_eq!(named[1].value, "b");
    }

    #[test]
    fn test_adapter_round_trip() {
        let values = vec![Value::Null, Value::from(1), Value::from("x"), Value::from(0.5)];
        let round = values_from_named_values(named_values_from_values(values.clone()));
        assert_eq!(round, values);

        let empty: Vec<Value> = vec![];
        assert!(named_values_from_values(empty).is_empty());
    }

    #[test]
    fn test_named_value_keeps_ordinal() {
        let nv = NamedValue::named("id", 3, Value::from(7));
        assert_eq!(nv.name.as_deref(), Some("id"));
        assert_eq!(nv.ordinal, 3);
    }

    #[test]
    fn test_interpolate_positional() {
        let params = named_values_from_values(vec![Value::from(18), Value::from("bob")]);
        let sql = interpolate("SELECT * FROM users WHERE age > ? AND name = ?", &params).unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE age > 18 AND name = 'bob'");
    }

    #[test]
    fn test_interpolate_uses_ordinal_order() {
        let params = vec![
            NamedValue::positional(2, Value::from("second")),
            NamedValue::positional(1, Value::from("first")),
        ];
        assert_eq!(
            interpolate("VALUES (?, ?)", &params).unwrap(),
            "VALUES ('first', 'second')"
        );
    }

    #[test]
    fn test_interpolate_named() {
        let params = vec![
            NamedValue::named("lo", 1, Value::from(1)),
            NamedValue::named("hi", 2, Value::from(9)),
        ];
        let sql = interpolate("SELECT * FROM t WHERE a BETWEEN :lo AND :hi OR b = :lo", &params)
            .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a BETWEEN 1 AND 9 OR b = 1");
    }

    #[test]
    fn test_interpolate_skips_quotes_comments_and_casts() {
        let params = named_values_from_values(vec![Value::from(1)]);
        let sql = interpolate(
            "SELECT '?', \"a?\", 'it''s ?', 'x\\'?', '1'::int -- what?\n, /* :x ? */ ?",
            &params,
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT '?', \"a?\", 'it''s ?', 'x\\'?', '1'::int -- what?\n, /* :x ? */ 1"
        );
    }

    #[test]
    fn test_interpolate_count_mismatch() {
        let one = named_values_from_values(vec![Value::from(1)]);
        assert!(matches!(
            interpolate("SELECT ?, ?", &one),
            Err(QueryError::ParameterBindingError { index: 1, .. })
        ));

        let two = named_values_from_values(vec![Value::from(1), Value::from(2)]);
        assert!(matches!(
            interpolate("SELECT ?", &two),
            Err(QueryError::ParameterBindingError { .. })
        ));
    }

    #[test]
    fn test_interpolate_missing_name() {
        let params = vec![NamedValue::named("a", 1, Value::from(1))];
        assert!(matches!(
            interpolate("SELECT :b", &params),
            Err(QueryError::ParameterBindingError { .. })
        ));
    }

    #[test]
    fn test_interpolate_mixed_styles_rejected() {
        let params = vec![NamedValue::named("a", 1, Value::from(1))];
        assert!(interpolate("SELECT ?, :a", &params).is_err());
        assert!(interpolate("SELECT :a, ?", &params).is_err());
    }

    #[test]
    fn test_interpolate_unsupported_value_reports_index() {
        let params = named_values_from_values(vec![Value::from(1), Value::Float(f64::NAN)]);
        assert!(matches!(
            interpolate("SELECT ?, ?", &params),
            Err(QueryError::UnsupportedParameter { index: 1, .. })
        ));
    }

    #[test]
    fn test_interpolate_no_placeholders_rejects_params() {
        let one = named_values_from_values(vec![Value::from(1)]);
        assert!(matches!(
            interpolate("SELECT 1", &one),
            Err(QueryError::ParameterBindingError { index: 0, .. })
        ));

        let two = named_values_from_values(vec![Value::from(1), Value::from(2)]);
        assert!(matches!(
            interpolate("SELECT '?' -- ?", &two),
            Err(QueryError::ParameterBindingError { .. })
        ));
    }

    #[test]
    fn test_interpolate_keeps_hive_type_colons() {
        let location = named_values_from_values(vec![Value::from("s3://bucket/t/")]);
        assert_eq!(
            interpolate(
                "CREATE EXTERNAL TABLE t (s struct<a:int>) LOCATION ?",
                &location
            )
            .unwrap(),
            "CREATE EXTERNAL TABLE t (s struct<a:int>) LOCATION 's3://bucket/t/'"
        );

        let ddl = "CREATE TABLE t (m map<string,struct<x:int, y_2:string>>)";
        assert_eq!(interpolate(ddl, &[]).unwrap(), ddl);
        assert_eq!(placeholder_count(ddl), 0);

        let params = vec![NamedValue::named("n", 1, Value::from(5))];
        assert_eq!(
            interpolate("SELECT CAST(s AS struct<a:int>) FROM t LIMIT :n", &params).unwrap(),
            "SELECT CAST(s AS struct<a:int>) FROM t LIMIT 5"
        );
    }

    #[test]
    fn test_no_placeholders_no_params() {
        assert_eq!(interpolate("SELECT 1", &[]).unwrap(), "SELECT 1");
        assert_eq!(placeholder_count("SELECT 1"), 0);
        assert_eq!(placeholder_count("SELECT ?, :a, '?'"), 2);
    }
}

//! Connection parameter parsing and validation.
//!
//! This module handles parsing connection strings and building connection
//! parameters with validation.

use crate::connection::env::{
    ConfigLookup, DATABASE_VARS, OUTPUT_LOCATION_VARS, REGION_VARS, WORKGROUP_VARS,
};
use crate::error::ConnectionError;
use crate::query::ExecutionOptions;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_DATABASE: &str = "default";
pub const DEFAULT_WORKGROUP: &str = "primary";

/// Connection parameters for a query service connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionParams {
    /// Where the service writes result files, `s3://bucket[/prefix]`
    pub output_location: String,

    /// Service region (default: us-east-1)
    pub region: String,

    /// Database queries run against (default: `default`)
    pub database: String,

    /// Workgroup queries are billed to (default: `primary`)
    pub work_group: String,

    /// Delay between status polls (default: 1s)
    pub poll_interval: Duration,

    /// Log a cost line for every finished query
    pub report_cost: bool,

    /// Reject statements that modify data or schema
    pub read_only: bool,

    /// Per-query deadline measured from submission
    pub deadline: Option<Duration>,

    /// Additional connection attributes
    pub attributes: HashMap<String, String>,
}

impl ConnectionParams {
    /// Create a new ConnectionBuilder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Execution settings derived from these parameters.
    pub fn execution_options(&self) -> ExecutionOptions {
        let mut options = ExecutionOptions::default()
            .with_poll_interval(self.poll_interval)
            .with_report_cost(self.report_cost);
        if let Some(deadline) = self.deadline {
            options = options.with_deadline(deadline);
        }
        options.database = Some(self.database.clone());
        options.work_group = Some(self.work_group.clone());
        options.output_location = Some(self.output_location.clone());
        options
    }
}

impl FromStr for ConnectionParams {
    type Err = ConnectionError;

    /// Parse a connection string in the format:
    /// `s3://bucket[/prefix][?param=value&...]`
    ///
    /// The `s3://...` part is the query output location.
    ///
    /// # Examples
    ///
    /// ```
    /// # use athena_rs::connection::ConnectionParams;
    /// # use std::str::FromStr;
    /// // Output location only
    /// let params = ConnectionParams::from_str("s3://my-bucket/results")?;
    ///
    /// // With region, database and workgroup
    /// let params = ConnectionParams::from_str(
    ///     "s3://my-bucket/results?region=eu-west-1&db=sales&workgroup=analysts"
    /// )?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = s.trim();

        if !url.starts_with("s3://") {
            return Err(ConnectionError::ParseError(
                "Connection string must start with 's3://'".to_string(),
            ));
        }

        let (location, query_string) = match url.split_once('?') {
            Some((main, query)) => (main, Some(query)),
            None => (url, None),
        };

        let params = parse_query_params(query_string)?;

        let builder = ConnectionBuilder::new().output_location(location);
        apply_query_params(builder, params)?.build()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConnectionParams {{ output_location: {}, region: {}, database: {}, work_group: {}, read_only: {} }}",
            self.output_location, self.region, self.database, self.work_group, self.read_only
        )
    }
}

/// Builder for constructing ConnectionParams with validation.
#[derive(Debug, Clone, Default)]
pub struct ConnectionBuilder {
    output_location: Option<String>,
    region: Option<String>,
    database: Option<String>,
    work_group: Option<String>,
    poll_interval: Option<Duration>,
    report_cost: Option<bool>,
    read_only: Option<bool>,
    deadline: Option<Duration>,
    attributes: HashMap<String, String>,
}

impl ConnectionBuilder {
    /// Create a new ConnectionBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder seeded from a configuration source.
    ///
    /// Region comes from `AWS_REGION` or `AWS_DEFAULT_REGION`, workgroup from
    /// `ATHENA_WORKGROUP`, database from `ATHENA_DATABASE` and output location
    /// from `ATHENA_OUTPUT_LOCATION`. Empty values are ignored.
    pub fn from_lookup(lookup: &dyn ConfigLookup) -> Self {
        let non_empty = |names: &[&str]| Some(lookup.lookup_first_set(names)).filter(|v| !v.is_empty());

        Self {
            output_location: non_empty(OUTPUT_LOCATION_VARS),
            region: non_empty(REGION_VARS),
            database: non_empty(DATABASE_VARS),
            work_group: non_empty(WORKGROUP_VARS),
            ..Self::default()
        }
    }

    /// Set the output location.
    pub fn output_location(mut self, location: &str) -> Self {
        self.output_location = Some(location.to_string());
        self
    }

    /// Set the region.
    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// Set the database.
    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    /// Set the workgroup.
    pub fn work_group(mut self, work_group: &str) -> Self {
        self.work_group = Some(work_group.to_string());
        self
    }

    /// Set the delay between status polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Enable or disable cost reporting.
    pub fn report_cost(mut self, report_cost: bool) -> Self {
        self.report_cost = Some(report_cost);
        self
    }

    /// Enable or disable read-only mode.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    /// Set the per-query deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Add a custom connection attribute.
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Build the ConnectionParams with validation.
    pub fn build(self) -> Result<ConnectionParams, ConnectionError> {
        let output_location =
            self.output_location
                .ok_or_else(|| ConnectionError::InvalidParameter {
                    parameter: "output_location".to_string(),
                    message: "Output location is required".to_string(),
                })?;

        let bucket = output_location
            .strip_prefix("s3://")
            .ok_or_else(|| ConnectionError::InvalidParameter {
                parameter: "output_location".to_string(),
                message: "Output location must start with 's3://'".to_string(),
            })?
            .split('/')
            .next()
            .unwrap_or_default();
        if bucket.is_empty() {
            return Err(ConnectionError::InvalidParameter {
                parameter: "output_location".to_string(),
                message: "Bucket name cannot be empty".to_string(),
            });
        }

        let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        if region.is_empty() {
            return Err(ConnectionError::InvalidParameter {
                parameter: "region".to_string(),
                message: "Region cannot be empty".to_string(),
            });
        }

        let poll_interval = self.poll_interval.unwrap_or(Duration::from_secs(1));
        if poll_interval.is_zero() {
            return Err(ConnectionError::InvalidParameter {
                parameter: "poll_interval".to_string(),
                message: "Poll interval must be greater than 0".to_string(),
            });
        }

        Ok(ConnectionParams {
            output_location,
            region,
            database: self
                .database
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            work_group: self
                .work_group
                .unwrap_or_else(|| DEFAULT_WORKGROUP.to_string()),
            poll_interval,
            report_cost: self.report_cost.unwrap_or(false),
            read_only: self.read_only.unwrap_or(false),
            deadline: self.deadline,
            attributes: self.attributes,
        })
    }
}

/// Parse query parameters from URL query string.
fn parse_query_params(query: Option<&str>) -> Result<HashMap<String, String>, ConnectionError> {
    let mut params = HashMap::new();

    if let Some(query) = query {
        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => {
                    return Err(ConnectionError::ParseError(format!(
                        "Invalid query parameter format: {}",
                        pair
                    )));
                }
            };

            let key = urlencoding::decode(key)
                .map_err(|e| ConnectionError::ParseError(format!("Failed to decode key: {}", e)))?
                .into_owned();
            let value = urlencoding::decode(value)
                .map_err(|e| ConnectionError::ParseError(format!("Failed to decode value: {}", e)))?
                .into_owned();

            params.insert(key, value);
        }
    }

    Ok(params)
}

/// Apply query parameters to builder.
fn apply_query_params(
    mut builder: ConnectionBuilder,
    params: HashMap<String, String>,
) -> Result<ConnectionBuilder, ConnectionError> {
    for (key, value) in params {
        match key.as_str() {
            "region" => builder = builder.region(&value),
            "db" | "database" => builder = builder.database(&value),
            "workgroup" | "work_group" => builder = builder.work_group(&value),
            "poll_interval_ms" => {
                let millis = parse_u64(&key, &value)?;
                builder = builder.poll_interval(Duration::from_millis(millis));
            }
            "deadline_secs" | "timeout" => {
                let secs = parse_u64(&key, &value)?;
                builder = builder.deadline(Duration::from_secs(secs));
            }
            "report_cost" | "cost" => builder = builder.report_cost(parse_bool(&value)?),
            "read_only" | "readonly" => builder = builder.read_only(parse_bool(&value)?),
            _ => {
                // Store as custom attribute
                builder = builder.attribute(&key, &value);
            }
        }
    }

    Ok(builder)
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConnectionError> {
    value.parse().map_err(|_| ConnectionError::InvalidParameter {
        parameter: key.to_string(),
        message: format!("Invalid number: {}", value),
    })
}

/// Parse boolean value from string.
fn parse_bool(s: &str) -> Result<bool, ConnectionError> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConnectionError::InvalidParameter {
            parameter: "boolean".to_string(),
            message: format!("Invalid boolean value: {}", s),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_minimal() {
        let params = ConnectionBuilder::new()
            .output_location("s3://bucket")
            .build()
            .unwrap();

        assert_eq!(params.output_location, "s3://bucket");
        assert_eq!(params.region, "us-east-1");
        assert_eq!(params.database, "default");
        assert_eq!(params.work_group, "primary");
        assert_eq!(params.poll_interval, Duration::from_secs(1));
        assert!(!params.report_cost);
        assert!(!params.read_only);
        assert!(params.deadline.is_none());
    }

    #[test]
    fn test_builder_full() {
        let params = ConnectionBuilder::new()
            .output_location("s3://bucket/prefix")
            .region("eu-central-1")
            .database("sales")
            .work_group("analysts")
            .poll_interval(Duration::from_millis(250))
            .report_cost(true)
            .read_only(true)
            .deadline(Duration::from_secs(60))
            .attribute("custom", "value")
            .build()
            .unwrap();

        assert_eq!(params.region, "eu-central-1");
        assert_eq!(params.database, "sales");
        assert_eq!(params.work_group, "analysts");
        assert_eq!(params.poll_interval, Duration::from_millis(250));
        assert!(params.report_cost);
        assert!(params.read_only);
        assert_eq!(params.deadline, Some(Duration::from_secs(60)));
        assert_eq!(params.attributes.get("custom"), Some(&"value".to_string()));
    }

    #[test]
    fn test_builder_validation_missing_location() {
        let result = ConnectionBuilder::new().build();

        assert!(matches!(
            result.unwrap_err(),
            ConnectionError::InvalidParameter { parameter, .. } if parameter == "output_location"
        ));
    }

    #[test]
    fn test_builder_validation_empty_bucket() {
        assert!(ConnectionBuilder::new().output_location("s3://").build().is_err());
        assert!(ConnectionBuilder::new().output_location("s3:///x").build().is_err());
        assert!(ConnectionBuilder::new().output_location("gs://b").build().is_err());
    }

    #[test]
    fn test_builder_validation_zero_poll_interval() {
        let result = ConnectionBuilder::new()
            .output_location("s3://bucket")
            .poll_interval(Duration::ZERO)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_basic() {
        let params = ConnectionParams::from_str("s3://bucket/path/to").unwrap();

        assert_eq!(params.output_location, "s3://bucket/path/to");
        assert_eq!(params.region, "us-east-1");
    }

    #[test]
    fn test_parse_with_query_params() {
        let params = ConnectionParams::from_str(
            "s3://bucket?region=us-west-2&db=logs&workgroup=etl&poll_interval_ms=500&report_cost=true&read_only=yes&deadline_secs=90",
        )
        .unwrap();

        assert_eq!(params.output_location, "s3://bucket");
        assert_eq!(params.region, "us-west-2");
        assert_eq!(params.database, "logs");
        assert_eq!(params.work_group, "etl");
        assert_eq!(params.poll_interval, Duration::from_millis(500));
        assert!(params.report_cost);
        assert!(params.read_only);
        assert_eq!(params.deadline, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_parse_url_encoded() {
        let params = ConnectionParams::from_str("s3://bucket?db=my%20db&tag=a%26b").unwrap();

        assert_eq!(params.database, "my db");
        assert_eq!(params.attributes.get("tag"), Some(&"a&b".to_string()));
    }

    #[test]
    fn test_parse_invalid_values() {
        assert!(ConnectionParams::from_str("s3://bucket?read_only=maybe").is_err());
        assert!(ConnectionParams::from_str("s3://bucket?poll_interval_ms=-1").is_err());
        assert!(ConnectionParams::from_str("s3://bucket?region").is_err());
    }

    #[test]
    fn test_parse_invalid_scheme() {
        let result = ConnectionParams::from_str("https://bucket/results");
        assert!(matches!(result, Err(ConnectionError::ParseError(_))));
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<String, String> = [
            ("AWS_DEFAULT_REGION", "ap-south-1"),
            ("ATHENA_WORKGROUP", "nightly"),
            ("ATHENA_DATABASE", ""),
            ("ATHENA_OUTPUT_LOCATION", "s3://env-bucket/out"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let params = ConnectionBuilder::from_lookup(&env).build().unwrap();
        assert_eq!(params.region, "ap-south-1");
        assert_eq!(params.work_group, "nightly");
        assert_eq!(params.database, "default");
        assert_eq!(params.output_location, "s3://env-bucket/out");
    }

    #[test]
    fn test_execution_options() {
        let params = ConnectionParams::from_str("s3://bucket?db=sales&deadline_secs=5").unwrap();
        let options = params.execution_options();

        assert_eq!(options.database.as_deref(), Some("sales"));
        assert_eq!(options.work_group.as_deref(), Some("primary"));
        assert_eq!(options.output_location.as_deref(), Some("s3://bucket"));
        assert_eq!(options.deadline, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_display() {
        let params = ConnectionParams::from_str("s3://bucket").unwrap();
        let display = format!("{}", params);
        assert!(display.contains("s3://bucket"));
        assert!(display.contains("primary"));
    }
}

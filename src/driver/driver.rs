//! Driver implementation.
//!
//! This module provides the `Driver` type which contains metadata about the
//! athena-rs driver and serves as a factory for creating `Database` instances.

use crate::driver::Database;
use crate::error::ConnectionError;
use std::str::FromStr;

/// SQL driver for the query service.
///
/// The `Driver` type provides metadata about the driver implementation and is
/// the entry point for opening databases.
///
/// # Example
///
/// ```
/// use athena_rs::driver::Driver;
///
/// let driver = Driver::new();
/// println!("Driver: {} v{}", driver.name(), driver.version());
/// println!("Vendor: {}", driver.vendor());
/// ```
#[derive(Debug, Clone)]
pub struct Driver {
    /// Driver name
    name: String,
    /// Driver version
    version: String,
    /// Vendor name
    vendor: String,
    /// Driver description
    description: String,
}

impl Driver {
    /// Create a new Driver instance.
    ///
    /// # Example
    ///
    /// ```
    /// use athena_rs::driver::Driver;
    ///
    /// let driver = Driver::new();
    /// assert_eq!(driver.name(), "athena-rs");
    /// ```
    pub fn new() -> Self {
        Self {
            name: "athena-rs".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            vendor: "athena-rs contributors".to_string(),
            description: "SQL driver for submit/poll/paginate query services with Arrow results"
                .to_string(),
        }
    }

    /// Get the driver name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the driver version.
    ///
    /// # Returns
    ///
    /// The version string from the Cargo.toml.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the vendor name.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Get the driver description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Open a database from a connection string.
    ///
    /// # Arguments
    ///
    /// * `connection_string` - Connection string in the format:
    ///   `s3://bucket[/prefix][?param=value&...]`
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the connection string is invalid.
    ///
    /// # Example
    ///
    /// ```
    /// use athena_rs::driver::Driver;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let driver = Driver::new();
    /// let database = driver.open("s3://my-bucket/results?db=sales")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(&self, connection_string: &str) -> Result<Database, ConnectionError> {
        Database::from_str(connection_string)
    }

    /// Check if a connection string is valid.
    ///
    /// # Example
    ///
    /// ```
    /// use athena_rs::driver::Driver;
    ///
    /// let driver = Driver::new();
    /// assert!(driver.validate_connection_string("s3://bucket"));
    /// assert!(!driver.validate_connection_string("invalid://connection"));
    /// ```
    pub fn validate_connection_string(&self, connection_string: &str) -> bool {
        Database::from_str(connection_string).is_ok()
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} ({})", self.name, self.version, self.vendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_creation() {
        let driver = Driver::new();
        assert_eq!(driver.name(), "athena-rs");
        assert_eq!(driver.vendor(), "athena-rs contributors");
        assert!(!driver.version().is_empty());
        assert!(!driver.description().is_empty());
    }

    #[test]
    fn test_driver_display() {
        let display = format!("{}", Driver::default());
        assert!(display.contains("athena-rs"));
        assert!(display.contains("contributors"));
    }

    #[test]
    fn test_driver_open() {
        let driver = Driver::new();
        assert!(driver.open("s3://bucket/prefix?region=eu-west-1").is_ok());
        assert!(driver.open("invalid://connection").is_err());
    }

    #[test]
    fn test_validate_connection_string() {
        let driver = Driver::new();

        assert!(driver.validate_connection_string("s3://bucket"));
        assert!(driver.validate_connection_string("s3://bucket/a/b?db=x&workgroup=y"));

        assert!(!driver.validate_connection_string(""));
        assert!(!driver.validate_connection_string("s3://"));
        assert!(!driver.validate_connection_string("s3://bucket?read_only=perhaps"));
    }
}

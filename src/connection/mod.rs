//! Connection configuration for the query service.
//!
//! This module provides connection parameter parsing and configuration
//! discovery from the environment.
//!
//! # Example
//!
//! ```no_run
//! # use athena_rs::connection::{ConnectionBuilder, ConnectionParams, ProcessEnv};
//! # use std::str::FromStr;
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Using ConnectionBuilder, seeded from the process environment
//! let params = ConnectionBuilder::from_lookup(&ProcessEnv)
//!     .output_location("s3://my-bucket/results")
//!     .database("sales")
//!     .poll_interval(std::time::Duration::from_millis(500))
//!     .build()?;
//!
//! // Or parse from connection string
//! let params = ConnectionParams::from_str(
//!     "s3://my-bucket/results?region=eu-west-1&db=sales&read_only=true"
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod params;

pub use env::{ConfigLookup, ProcessEnv};
pub use params::{ConnectionBuilder, ConnectionParams};

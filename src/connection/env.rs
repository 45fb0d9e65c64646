//! Configuration discovery from environment-like sources.
//!
//! Lookups go through [`ConfigLookup`] so that the process environment can be
//! swapped for a plain map in tests.

use std::collections::HashMap;

/// Names checked for the region, in order.
pub const REGION_VARS: &[&str] = &["AWS_REGION", "AWS_DEFAULT_REGION"];
/// Names checked for the workgroup.
pub const WORKGROUP_VARS: &[&str] = &["ATHENA_WORKGROUP"];
/// Names checked for the database.
pub const DATABASE_VARS: &[&str] = &["ATHENA_DATABASE"];
/// Names checked for the output location.
pub const OUTPUT_LOCATION_VARS: &[&str] = &["ATHENA_OUTPUT_LOCATION"];

/// A source of named configuration values.
pub trait ConfigLookup {
    /// Value of `name`, or `None` if it is not set. Set-but-empty is `Some("")`.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Value of the first name in `names` that is set, or `""` if none are.
    fn lookup_first_set(&self, names: &[&str]) -> String {
        names
            .iter()
            .find_map(|name| self.lookup(name))
            .unwrap_or_default()
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl ConfigLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

//! Cost estimate for a finished query.
//!
//! The service bills per byte scanned, rounded up to a whole megabyte with a
//! ten megabyte minimum per query.

use crate::transport::QueryStatistics;
use std::fmt;

/// Dollars billed per terabyte scanned.
pub const PRICE_PER_TB: f64 = 5.0;

const MB: u64 = 1024 * 1024;
const TB: u64 = 1024 * 1024 * 1024 * 1024;

/// Smallest number of bytes billed for a query.
pub const MIN_BILLED_BYTES: u64 = 10 * MB;

/// Bytes scanned and what they cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    /// Bytes scanned as reported by the service
    pub bytes_scanned: u64,
    /// Bytes billed after rounding and the minimum charge
    pub billed_bytes: u64,
    /// Estimated charge in dollars
    pub dollars: f64,
}

impl CostEstimate {
    /// Compute the estimate for a byte count.
    pub fn new(bytes_scanned: u64) -> Self {
        let billed_bytes = bytes_scanned.div_ceil(MB).saturating_mul(MB).max(MIN_BILLED_BYTES);
        let dollars = billed_bytes as f64 / TB as f64 * PRICE_PER_TB;

        Self {
            bytes_scanned,
            billed_bytes,
            dollars,
        }
    }

    /// Compute the estimate from reported statistics.
    ///
    /// Returns `None` when the service did not report bytes scanned.
    pub fn from_statistics(statistics: &QueryStatistics) -> Option<Self> {
        statistics
            .data_scanned_in_bytes
            .map(|bytes| Self::new(bytes.max(0) as u64))
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data scanned: {}, billed: {}, cost: ${:.6}",
            format_bytes(self.bytes_scanned),
            format_bytes(self.billed_bytes),
            self.dollars
        )
    }
}

/// Format a byte count with binary magnitude scaling: `512 B`, `1.5 KB`, `10.0 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(10 * MB), "10.0 MB");
        assert_eq!(format_bytes(TB), "1.0 TB");
        assert_eq!(format_bytes(u64::MAX), "16.0 EB");
    }

    #[test]
    fn test_minimum_charge() {
        let estimate = CostEstimate::new(1);
        assert_eq!(estimate.billed_bytes, MIN_BILLED_BYTES);
        assert_eq!(CostEstimate::new(0).billed_bytes, MIN_BILLED_BYTES);
    }

    #[test]
    fn test_rounds_up_to_megabyte() {
        let estimate = CostEstimate::new(20 * MB + 1);
        assert_eq!(estimate.billed_bytes, 21 * MB);
    }

    #[test]
    fn test_one_terabyte_costs_price() {
        let estimate = CostEstimate::new(TB);
        assert!((estimate.dollars - PRICE_PER_TB).abs() < 1e-9);
    }

    #[test]
    fn test_absent_bytes_no_estimate() {
        assert!(CostEstimate::from_statistics(&QueryStatistics::default()).is_none());

        let stats = QueryStatistics {
            data_scanned_in_bytes: Some(12_345_678),
            engine_execution_time_in_millis: None,
        };
        let estimate = CostEstimate::from_statistics(&stats).unwrap();
        assert_eq!(estimate.bytes_scanned, 12_345_678);
    }

    #[test]
    fn test_display() {
        let line = CostEstimate::new(TB).to_string();
        assert_eq!(line, "data scanned: 1.0 TB, billed: 1.0 TB, cost: $5.000000");
    }
}

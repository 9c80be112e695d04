//! Unit label normalization.
//!
//! All latency figures are reduced to milliseconds and all bandwidth figures
//! to KB/s at extraction time; the aggregator performs weighted arithmetic
//! only and never converts units again.

use crate::error::SummaryError;

/// Scale factor for a rate or time unit label, relative to the base unit
/// (`B/s` for rates, `sec` for times).
///
/// Recognized labels: `B/s`, `KB/s`/`kB/s`, `MB/s`, `GB/s`, `sec`, `msec`,
/// `usec`, `nsec`. Unrecognized labels fail with
/// [`SummaryError::UnknownUnit`] rather than scaling by zero.
pub fn scale_factor(unit: &str) -> Result<f64, SummaryError> {
    match unit {
        "B/s" | "sec" => Ok(1.0),
        "KB/s" | "kB/s" | "msec" => Ok(1e3),
        "MB/s" | "usec" => Ok(1e6),
        "GB/s" | "nsec" => Ok(1e9),
        other => Err(SummaryError::UnknownUnit(other.to_string())),
    }
}

/// Convert a latency value expressed in `unit` to milliseconds.
pub fn to_millis(value: f64, unit: &str) -> Result<f64, SummaryError> {
    Ok(value / scale_factor(unit)? * 1e3)
}

/// Convert a bandwidth value expressed in `unit` to KB/s.
pub fn to_kbps(value: f64, unit: &str) -> Result<f64, SummaryError> {
    Ok(value * scale_factor(unit)? / 1e3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factor_time_units() {
        assert_eq!(scale_factor("sec").unwrap(), 1.0);
        assert_eq!(scale_factor("msec").unwrap(), 1e3);
        assert_eq!(scale_factor("usec").unwrap(), 1e6);
        assert_eq!(scale_factor("nsec").unwrap(), 1e9);
    }

    #[test]
    fn test_scale_factor_rate_units() {
        assert_eq!(scale_factor("B/s").unwrap(), 1.0);
        assert_eq!(scale_factor("KB/s").unwrap(), 1e3);
        assert_eq!(scale_factor("kB/s").unwrap(), 1e3);
        assert_eq!(scale_factor("MB/s").unwrap(), 1e6);
        assert_eq!(scale_factor("GB/s").unwrap(), 1e9);
    }

    #[test]
    fn test_scale_factor_unknown_unit() {
        assert!(matches!(
            scale_factor("TiB/s"),
            Err(SummaryError::UnknownUnit(_))
        ));
        assert!(scale_factor("").is_err());
    }

    #[test]
    fn test_to_millis() {
        assert_eq!(to_millis(1500.0, "usec").unwrap(), 1.5);
        assert_eq!(to_millis(2_000_000.0, "nsec").unwrap(), 2.0);
        assert_eq!(to_millis(3.0, "msec").unwrap(), 3.0);
        assert_eq!(to_millis(0.25, "sec").unwrap(), 250.0);
    }

    #[test]
    fn test_to_kbps() {
        assert_eq!(to_kbps(1.0, "MB/s").unwrap(), 1000.0);
        assert_eq!(to_kbps(2048.0, "B/s").unwrap(), 2.048);
        assert_eq!(to_kbps(7.0, "KB/s").unwrap(), 7.0);
    }
}

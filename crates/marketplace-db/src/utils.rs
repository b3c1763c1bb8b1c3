//! Shared utility functions

use chrono::{DateTime, Utc};

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Rows written by this crate always carry RFC3339 timestamps; the fallback
/// only matters for rows edited by hand.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Convert a Unix timestamp (seconds) to a UTC datetime, clamping invalid values to the epoch
pub fn datetime_from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Round a monetary amount to two decimal places
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_or_now() {
        let valid_time = "2024-01-01T12:00:00Z";
        let parsed = parse_datetime_or_now(valid_time);
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T12:00:00+00:00");

        // Invalid time should return current time (just check it doesn't panic)
        let invalid_time = "invalid";
        let now_before = Utc::now();
        let parsed = parse_datetime_or_now(invalid_time);
        let now_after = Utc::now();
        assert!(parsed >= now_before && parsed <= now_after);
    }

    #[test]
    fn test_datetime_from_unix() {
        assert_eq!(
            datetime_from_unix(1_704_110_400).to_rfc3339(),
            "2024-01-01T12:00:00+00:00"
        );
        assert_eq!(datetime_from_unix(i64::MAX), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(10.0 * 3.0), 30.0);
        assert_eq!(round_money(0.1 + 0.2), 0.3);
        assert_eq!(round_money(19.999), 20.0);
    }
}

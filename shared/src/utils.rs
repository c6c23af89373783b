// Formatting and parsing helpers shared across the engine and its consumers.

// Timestamps as written by the upstream collectors, e.g. "2024-11-20 12:10:00" (UTC).
pub mod snapshot_format {
    use anyhow::{anyhow, Result};
    use chrono::{DateTime, NaiveDateTime, Utc};

    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    // Accepts the collector format first, then RFC 3339 as written by other tooling.
    pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        let trimmed = s.trim();
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| anyhow!("Failed to parse timestamp '{}': {}", s, e))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::{Datelike, TimeZone, Timelike};

        #[test]
        fn test_parse_collector_format() {
            let ts = parse_timestamp("2024-11-20 12:10:00").unwrap();
            assert_eq!(ts.year(), 2024);
            assert_eq!(ts.month(), 11);
            assert_eq!(ts.hour(), 12);
            assert_eq!(ts.minute(), 10);
        }

        #[test]
        fn test_parse_rfc3339_with_offset() {
            let ts = parse_timestamp("2024-11-20T14:10:00+02:00").unwrap();
            assert_eq!(ts, Utc.with_ymd_and_hms(2024, 11, 20, 12, 10, 0).unwrap());
        }

        #[test]
        fn test_parse_invalid() {
            assert!(parse_timestamp("20/11/2024 12:10").is_err());
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// "+1.25%" / "-0.40%"; zero renders with a plus sign.
pub fn signed_percent(value: f64) -> String {
    let sign = if value >= 0.0 { '+' } else { '-' };
    format!("{}{:.2}%", sign, value.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(37.499), 37.5);
        assert_eq!(round2(-1.960784), -1.96);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_signed_percent() {
        assert_eq!(signed_percent(5.0), "+5.00%");
        assert_eq!(signed_percent(0.0), "+0.00%");
        assert_eq!(signed_percent(-1.96), "-1.96%");
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Get cache directory from environment variable or use default
pub fn get_cache_dir() -> PathBuf {
    std::env::var("NSE_CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("nse_data"))
}

/// Parse a timestamp from the formats used in cache files.
///
/// Accepts RFC 3339, "YYYY-MM-DD HH:MM:SS", and bare "YYYY-MM-DD"
/// (interpreted as midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::Parse(format!("Invalid date: {}", s)))?;
        return Ok(midnight.and_utc());
    }

    Err(Error::Parse(format!("Unrecognized timestamp: {}", s)))
}

/// Parse a "YYYY-MM-DD" date argument
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("Invalid date '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let dt = parse_timestamp("2024-03-15T03:45:00+00:00").unwrap();
        assert_eq!(dt.hour(), 3);
        assert_eq!(dt.minute(), 45);
    }

    #[test]
    fn test_parse_timestamp_space_separated() {
        let dt = parse_timestamp("2024-03-15 09:15:00").unwrap();
        assert_eq!(dt.hour(), 9);
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        let dt = parse_timestamp("2024-03-15").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-03-15");
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("15/03/2024").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-01-01").is_ok());
        assert!(parse_date("2024-13-01").is_err());
    }
}

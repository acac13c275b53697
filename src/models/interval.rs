use serde::{Deserialize, Serialize};
use std::fmt;

/// Interval types for market data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// Daily candles -> daily.csv
    Daily,
    /// Weekly candles -> weekly.csv
    Weekly,
}

impl Interval {
    /// Convert to Yahoo chart API format ("1d", "1wk")
    pub fn to_yahoo_format(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
        }
    }

    /// Convert to cache filename (daily.csv, weekly.csv)
    pub fn to_filename(&self) -> &'static str {
        match self {
            Interval::Daily => "daily.csv",
            Interval::Weekly => "weekly.csv",
        }
    }

    /// Metadata sidecar filename for this interval
    pub fn to_meta_filename(&self) -> &'static str {
        match self {
            Interval::Daily => "daily.meta.json",
            Interval::Weekly => "weekly.meta.json",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "1d" | "daily" => Ok(Interval::Daily),
            "1wk" | "1w" | "weekly" => Ok(Interval::Weekly),
            _ => Err(format!("Invalid interval: {}. Valid options: 1d, 1wk", s)),
        }
    }

    /// Parse multiple intervals from comma-separated string or "all"
    pub fn parse_intervals(s: &str) -> Result<Vec<Self>, String> {
        if s.to_lowercase() == "all" {
            return Ok(vec![Interval::Daily, Interval::Weekly]);
        }

        s.split(',')
            .map(|part| Interval::parse(part.trim()))
            .collect()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_yahoo_format())
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Daily
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_yahoo_format() {
        assert_eq!(Interval::Daily.to_yahoo_format(), "1d");
        assert_eq!(Interval::Weekly.to_yahoo_format(), "1wk");
    }

    #[test]
    fn test_to_filename() {
        assert_eq!(Interval::Daily.to_filename(), "daily.csv");
        assert_eq!(Interval::Weekly.to_filename(), "weekly.csv");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Interval::parse("1d").unwrap(), Interval::Daily);
        assert_eq!(Interval::parse("DAILY").unwrap(), Interval::Daily);
        assert_eq!(Interval::parse("1wk").unwrap(), Interval::Weekly);
        assert_eq!(Interval::parse("weekly").unwrap(), Interval::Weekly);
        assert!(Interval::parse("1h").is_err());
    }

    #[test]
    fn test_parse_intervals() {
        let all = Interval::parse_intervals("all").unwrap();
        assert_eq!(all, vec![Interval::Daily, Interval::Weekly]);

        let daily = Interval::parse_intervals("1d").unwrap();
        assert_eq!(daily, vec![Interval::Daily]);

        let multiple = Interval::parse_intervals("1d, weekly").unwrap();
        assert_eq!(multiple, vec![Interval::Daily, Interval::Weekly]);

        assert!(Interval::parse_intervals("1d,bogus").is_err());
    }
}

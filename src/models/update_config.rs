use chrono::{NaiveDate, Utc};

use crate::constants::{CACHE_MAX_AGE_HOURS, DEFAULT_CONCURRENCY, DEFAULT_START_DATE};
use crate::models::Interval;

/// Configuration for one updater pass
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Start date for historical data
    pub start_date: NaiveDate,

    /// End date for data fetch (usually today)
    pub end_date: NaiveDate,

    /// Intervals to update
    pub intervals: Vec<Interval>,

    /// Number of tickers fetched concurrently per chunk
    pub concurrent_fetches: usize,

    /// Stop the pass when any ticker fails instead of skipping it
    pub abort_on_failure: bool,

    /// Refetch even when a fresh cache entry covers the range
    pub force: bool,

    /// Cache entries younger than this many hours count as fresh
    pub max_age_hours: i64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::parse_from_str(DEFAULT_START_DATE, "%Y-%m-%d")
                .unwrap_or_else(|_| NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()),
            end_date: Utc::now().date_naive(),
            intervals: vec![Interval::Daily],
            concurrent_fetches: DEFAULT_CONCURRENCY,
            abort_on_failure: false,
            force: false,
            max_age_hours: CACHE_MAX_AGE_HOURS,
        }
    }
}

/// Outcome counts for an updater pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Tickers fetched and cached
    pub successful: usize,

    /// Tickers that failed to fetch
    pub failed: usize,

    /// Tickers skipped because a fresh cache entry covered the range
    pub skipped: usize,

    /// Total records written to the cache
    pub records_written: usize,
}

impl UpdateStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_processed(&self) -> usize {
        self.successful + self.failed + self.skipped
    }

    pub fn merge(&mut self, other: &UpdateStats) {
        self.successful += other.successful;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.records_written += other.records_written;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UpdateConfig::default();
        assert_eq!(config.intervals, vec![Interval::Daily]);
        assert_eq!(config.concurrent_fetches, DEFAULT_CONCURRENCY);
        assert!(!config.abort_on_failure);
        assert!(!config.force);
    }

    #[test]
    fn test_stats_merge() {
        let mut stats = UpdateStats {
            successful: 3,
            failed: 1,
            skipped: 0,
            records_written: 300,
        };
        stats.merge(&UpdateStats {
            successful: 2,
            failed: 0,
            skipped: 1,
            records_written: 200,
        });

        assert_eq!(stats.successful, 5);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.records_written, 500);
        assert_eq!(stats.total_processed(), 7);
    }
}

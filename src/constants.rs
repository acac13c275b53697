//! Shared constants for fetching, caching, and breadth analysis.

/// Default period for the daily moving average breadth report (200 DMA)
pub const DMA_PERIOD_DEFAULT: usize = 200;

/// Default period for the weekly moving average breadth report.
/// 40 weeks of trading is approximately 200 daily sessions.
pub const WMA_PERIOD_DEFAULT: usize = 40;

/// Default start date for full history downloads
pub const DEFAULT_START_DATE: &str = "2016-01-01";

/// Default rolling window for ratio z-scores
pub const ZSCORE_WINDOW_DEFAULT: usize = 60;

/// Breadth history file written by the `breadth` command (relative to cache root)
pub const BREADTH_FILE: &str = "below_dma.csv";

/// Ticker universe file default (relative to current directory)
pub const DEFAULT_TICKERS_FILE: &str = "nse_tickers.csv";

/// Yahoo chart API requests allowed per minute
pub const RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Bounded HTTP retry attempts per request
pub const MAX_RETRIES: u32 = 3;

/// HTTP request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of concurrent fetch tasks in an updater pass
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Cache entries younger than this are considered fresh and skip refetching
pub const CACHE_MAX_AGE_HOURS: i64 = 18;

pub mod breadth;
pub mod once;
pub mod ratio;
pub mod status;

/// Exit code for a pass where some tickers failed
pub const EXIT_PARTIAL: i32 = 1;

/// Exit code for fatal errors (bad config, cache storage unavailable)
pub const EXIT_FATAL: i32 = 2;

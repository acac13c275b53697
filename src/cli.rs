use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_START_DATE, DEFAULT_TICKERS_FILE, ZSCORE_WINDOW_DEFAULT,
};

#[derive(Parser)]
#[command(name = "nsepulse")]
#[command(about = "NSE market data fetcher, cache, and breadth/ratio analysis", long_about = None)]
pub struct Cli {
    /// Cache directory (default: $NSE_CACHE_DIR or ./nse_data)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single fetch-and-cache pass over the ticker universe
    Once {
        /// CSV file with a `symbol` column listing the ticker universe
        #[arg(short, long, default_value = DEFAULT_TICKERS_FILE)]
        tickers_file: PathBuf,

        /// Start date for historical data (YYYY-MM-DD)
        #[arg(long, default_value = DEFAULT_START_DATE)]
        start: String,

        /// End date (YYYY-MM-DD, default: today)
        #[arg(long)]
        end: Option<String>,

        /// Intervals to fetch: 1d, 1wk, or comma-separated, or "all"
        #[arg(short, long, default_value = "1d")]
        intervals: String,

        /// Number of tickers fetched concurrently
        #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Stop the pass on the first ticker failure instead of skipping it
        #[arg(long)]
        abort_on_failure: bool,

        /// Refetch even when a fresh cache entry covers the range
        #[arg(long)]
        force: bool,
    },
    /// Show what the cache currently holds
    Status,
    /// Count cached tickers trading below their moving average
    Breadth {
        /// Moving average period (default: 200 for daily, 40 for weekly)
        #[arg(short, long)]
        period: Option<usize>,

        /// Average kind: simple or weighted
        #[arg(short, long, default_value = "simple")]
        kind: String,

        /// Interval to analyze: 1d or 1wk
        #[arg(short, long, default_value = "1d")]
        interval: String,
    },
    /// Ratio and rolling z-score between two cached tickers
    Ratio {
        /// Numerator ticker (e.g. ^NSEI)
        numerator: String,

        /// Denominator ticker (e.g. ^NSEBANK)
        denominator: String,

        /// Rolling window for the z-score
        #[arg(short, long, default_value_t = ZSCORE_WINDOW_DEFAULT)]
        window: usize,

        /// Interval to analyze: 1d or 1wk
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// Write the ratio series to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run() {
    let cli = Cli::parse();
    let cache_dir = cli
        .cache_dir
        .unwrap_or_else(crate::utils::get_cache_dir);

    match cli.command {
        Commands::Once {
            tickers_file,
            start,
            end,
            intervals,
            concurrency,
            abort_on_failure,
            force,
        } => {
            commands::once::run(
                cache_dir,
                tickers_file,
                start,
                end,
                intervals,
                concurrency,
                abort_on_failure,
                force,
            );
        }
        Commands::Status => {
            commands::status::run(cache_dir);
        }
        Commands::Breadth {
            period,
            kind,
            interval,
        } => {
            commands::breadth::run(cache_dir, period, kind, interval);
        }
        Commands::Ratio {
            numerator,
            denominator,
            window,
            interval,
            output,
        } => {
            commands::ratio::run(cache_dir, numerator, denominator, window, interval, output);
        }
    }
}

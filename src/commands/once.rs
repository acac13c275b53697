//! The `once` subcommand: one fetch-and-cache pass, meant to be invoked
//! from the OS task scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::{EXIT_FATAL, EXIT_PARTIAL};
use crate::error::Error;
use crate::models::{Interval, UpdateConfig, UpdateStats};
use crate::services::{load_tickers, CacheStore, DataUpdater, YahooClient};
use crate::utils::parse_date;

#[allow(clippy::too_many_arguments)]
pub fn run(
    cache_dir: PathBuf,
    tickers_file: PathBuf,
    start: String,
    end: Option<String>,
    intervals_arg: String,
    concurrency: usize,
    abort_on_failure: bool,
    force: bool,
) {
    let intervals = match Interval::parse_intervals(&intervals_arg) {
        Ok(intervals) => intervals,
        Err(e) => {
            eprintln!("❌ Error parsing intervals: {}", e);
            eprintln!("   Valid options: all, 1d, 1wk, or comma-separated (e.g., 1d,1wk)");
            std::process::exit(EXIT_FATAL);
        }
    };

    let config = match build_config(start, end, intervals, concurrency, abort_on_failure, force) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    let tickers = match load_tickers(&tickers_file) {
        Ok(tickers) => tickers,
        Err(e) => {
            eprintln!("❌ Failed to load tickers from {}: {}", tickers_file.display(), e);
            std::process::exit(EXIT_FATAL);
        }
    };

    println!(
        "📥 Updating {} tickers ({} to {}) into {}",
        tickers.len(),
        config.start_date,
        config.end_date,
        cache_dir.display()
    );

    match run_pass(cache_dir, config, tickers) {
        Ok(stats) => {
            println!(
                "\n✅ Pass completed: {} fetched, {} skipped (fresh), {} failed, {} records written",
                stats.successful, stats.skipped, stats.failed, stats.records_written
            );
            if stats.failed > 0 {
                std::process::exit(EXIT_PARTIAL);
            }
        }
        Err(e) => {
            eprintln!("\n❌ Pass aborted: {}", e);
            std::process::exit(EXIT_FATAL);
        }
    }
}

fn build_config(
    start: String,
    end: Option<String>,
    intervals: Vec<Interval>,
    concurrency: usize,
    abort_on_failure: bool,
    force: bool,
) -> Result<UpdateConfig, Error> {
    let start_date = parse_date(&start)?;
    let end_date = match end {
        Some(s) => parse_date(&s)?,
        None => chrono::Utc::now().date_naive(),
    };

    if start_date > end_date {
        return Err(Error::InvalidInput(format!(
            "Start date {} is after end date {}",
            start_date, end_date
        )));
    }

    Ok(UpdateConfig {
        start_date,
        end_date,
        intervals,
        concurrent_fetches: concurrency,
        abort_on_failure,
        force,
        ..UpdateConfig::default()
    })
}

fn run_pass(cache_dir: PathBuf, config: UpdateConfig, tickers: Vec<String>) -> Result<UpdateStats, Error> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Config(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let client = YahooClient::new(true).map_err(|e| Error::Network(e.to_string()))?;
        let cache = CacheStore::new(cache_dir);
        let updater = DataUpdater::new(Arc::new(client), cache, config);
        updater.run_once(&tickers).await
    })
}

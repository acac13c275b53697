//! The `status` subcommand: summarize what the cache holds.

use std::path::PathBuf;

use crate::commands::EXIT_FATAL;
use crate::models::Interval;
use crate::services::CacheStore;

pub fn run(cache_dir: PathBuf) {
    let cache = CacheStore::new(&cache_dir);

    let tickers = match cache.tickers() {
        Ok(tickers) => tickers,
        Err(e) => {
            eprintln!("❌ Failed to read cache at {}: {}", cache_dir.display(), e);
            std::process::exit(EXIT_FATAL);
        }
    };

    if tickers.is_empty() {
        println!("Cache at {} is empty. Run `nsepulse once` first.", cache_dir.display());
        return;
    }

    println!("📦 Cache: {} ({} tickers)\n", cache_dir.display(), tickers.len());
    println!(
        "{:<12} {:<8} {:>8} {:>12} {:>22}",
        "TICKER", "INTERVAL", "RECORDS", "LAST DATE", "FETCHED AT"
    );

    for ticker in &tickers {
        for interval in [Interval::Daily, Interval::Weekly] {
            match cache.get_latest(ticker, interval) {
                Ok(Some(entry)) => {
                    let last_date = entry
                        .series
                        .last()
                        .map(|c| c.time.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<12} {:<8} {:>8} {:>12} {:>22}",
                        ticker,
                        interval.to_yahoo_format(),
                        entry.series.len(),
                        last_date,
                        entry.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    eprintln!("⚠️  {} {}: unreadable entry: {}", ticker, interval, e);
                }
            }
        }
    }
}

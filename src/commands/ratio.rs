//! The `ratio` subcommand: pointwise quotient of two cached series with a
//! rolling z-score, the CLI version of the dashboard's index ratio view.

use std::path::{Path, PathBuf};

use crate::analysis::{ratio, zscore, RatioSeries};
use crate::commands::EXIT_FATAL;
use crate::error::{Error, Result};
use crate::models::{Interval, PriceSeries};
use crate::services::CacheStore;

pub fn run(
    cache_dir: PathBuf,
    numerator: String,
    denominator: String,
    window: usize,
    interval_arg: String,
    output: Option<PathBuf>,
) {
    let interval = match Interval::parse(&interval_arg) {
        Ok(interval) => interval,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    let cache = CacheStore::new(&cache_dir);
    let series_a = load_series(&cache, &numerator, interval);
    let series_b = load_series(&cache, &denominator, interval);

    let ratio_series = ratio(&series_a, &series_b);
    if ratio_series.is_empty() {
        eprintln!(
            "❌ No overlapping dates between {} ({} points) and {} ({} points)",
            numerator,
            series_a.len(),
            denominator,
            series_b.len()
        );
        std::process::exit(EXIT_FATAL);
    }

    let scores = zscore(&ratio_series, window);

    println!("📈 {} / {} ({} shared points)", numerator, denominator, ratio_series.len());
    if let (Some(mean), Some(std)) = (ratio_series.mean(), ratio_series.std_dev()) {
        println!("   Mean: {:.4}   Std: {:.4}", mean, std);
        println!("   +1 SD: {:.4}   -1 SD: {:.4}", mean + std, mean - std);
    }
    if let Some((time, value)) = ratio_series.last() {
        println!("   Latest ({}): {:.4}", time.format("%Y-%m-%d"), value);
    }
    match scores.last().copied().flatten() {
        Some(z) => println!("   Latest {}-period z-score: {:+.2}", window, z),
        None => println!("   Latest {}-period z-score: undefined", window),
    }

    if let Some(path) = output {
        if let Err(e) = write_ratio_csv(&path, &ratio_series, &scores) {
            eprintln!("❌ Failed to write {}: {}", path.display(), e);
            std::process::exit(EXIT_FATAL);
        }
        println!("   Written to {}", path.display());
    }
}

fn load_series(cache: &CacheStore, ticker: &str, interval: Interval) -> PriceSeries {
    match cache.get_latest(ticker, interval) {
        Ok(Some(entry)) => entry.series,
        Ok(None) => {
            eprintln!(
                "❌ No cached {} series for {}. Run `nsepulse once` with it in the universe first.",
                interval, ticker
            );
            std::process::exit(EXIT_FATAL);
        }
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", ticker, e);
            std::process::exit(EXIT_FATAL);
        }
    }
}

fn write_ratio_csv(path: &Path, ratio_series: &RatioSeries, scores: &[Option<f64>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["time", "ratio", "zscore"])?;

    for ((time, value), score) in ratio_series.points().iter().zip(scores.iter()) {
        writer.write_record([
            time.format("%Y-%m-%d").to_string(),
            value.to_string(),
            score.map(|z| z.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush().map_err(|e| Error::Io(e.to_string()))?;
    Ok(())
}

//! The `breadth` subcommand: how much of the cached universe trades below
//! its moving average. Appends one observation per run to below_dma.csv in
//! the cache root, building up the breadth history over scheduled runs.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::analysis::{below_ma_breadth, BreadthReport, MaKind};
use crate::commands::EXIT_FATAL;
use crate::constants::{BREADTH_FILE, DMA_PERIOD_DEFAULT, WMA_PERIOD_DEFAULT};
use crate::error::{Error, Result};
use crate::models::Interval;
use crate::services::CacheStore;

pub fn run(cache_dir: PathBuf, period: Option<usize>, kind_arg: String, interval_arg: String) {
    let kind = match MaKind::parse(&kind_arg) {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    let interval = match Interval::parse(&interval_arg) {
        Ok(interval) => interval,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    let period = period.unwrap_or(match interval {
        Interval::Daily => DMA_PERIOD_DEFAULT,
        Interval::Weekly => WMA_PERIOD_DEFAULT,
    });
    if period == 0 {
        eprintln!("❌ Period must be at least 1");
        std::process::exit(EXIT_FATAL);
    }

    let cache = CacheStore::new(&cache_dir);
    let mut universe = match cache.load_all(interval) {
        Ok(universe) => universe,
        Err(e) => {
            eprintln!("❌ Failed to load cached series: {}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    // No weekly data cached: derive weekly candles from the daily series
    if universe.is_empty() && interval == Interval::Weekly {
        match cache.load_all(Interval::Daily) {
            Ok(daily) => {
                universe = daily
                    .into_iter()
                    .map(|(ticker, series)| (ticker, series.resample_weekly()))
                    .collect();
                if !universe.is_empty() {
                    println!("ℹ️  No weekly series cached; resampled {} daily series", universe.len());
                }
            }
            Err(e) => {
                eprintln!("❌ Failed to load cached series: {}", e);
                std::process::exit(EXIT_FATAL);
            }
        }
    }

    if universe.is_empty() {
        eprintln!(
            "❌ No cached {} series in {}. Run `nsepulse once` first.",
            interval,
            cache_dir.display()
        );
        std::process::exit(EXIT_FATAL);
    }

    let Some(report) = below_ma_breadth(&universe, period, kind) else {
        eprintln!(
            "❌ No cached ticker has the {} observations needed for a {}-period average",
            period, period
        );
        std::process::exit(EXIT_FATAL);
    };

    let excluded = universe.len() - report.total;
    println!("📊 Breadth as of {} ({} {}-period MA)", report.date, kind, period);
    println!(
        "   {} of {} tickers below average ({:.1}%)",
        report.below, report.total, report.pct_below
    );
    if excluded > 0 {
        println!("   {} tickers excluded (insufficient history)", excluded);
    }

    let breadth_path = cache_dir.join(BREADTH_FILE);
    if let Err(e) = append_report(&breadth_path, &report) {
        eprintln!("❌ Failed to append to {}: {}", breadth_path.display(), e);
        std::process::exit(EXIT_FATAL);
    }
    println!("   Appended to {}", breadth_path.display());
}

fn append_report(path: &Path, report: &BreadthReport) -> Result<()> {
    let new_file = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::Io(e.to_string()))?;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if new_file {
        writer.write_record(["date", "below", "total", "pct_below"])?;
    }
    writer.write_record([
        report.date.format("%Y-%m-%d").to_string(),
        report.below.to_string(),
        report.total.to_string(),
        format!("{:.2}", report.pct_below),
    ])?;
    writer.flush().map_err(|e| Error::Io(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_append_report_creates_header_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(BREADTH_FILE);
        let report = BreadthReport {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            below: 120,
            total: 480,
            pct_below: 25.0,
        };

        append_report(&path, &report).unwrap();
        append_report(&path, &report).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,below,total,pct_below");
        assert_eq!(lines[1], "2024-03-15,120,480,25.00");
        assert_eq!(lines[2], lines[1]);
    }
}

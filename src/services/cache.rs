//! Flat-file price series cache.
//!
//! Layout mirrors one directory per ticker with one CSV per interval:
//!
//! ```text
//! <root>/RELIANCE/daily.csv
//! <root>/RELIANCE/daily.meta.json
//! <root>/^NSEI/weekly.csv
//! ```
//!
//! The metadata sidecar records the key (ticker, interval, date range) and
//! the fetch timestamp. Entries are overwritten on refresh, never mutated
//! in place, and never evicted automatically.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{Candle, Interval, PriceSeries};
use crate::utils::parse_timestamp;

/// Identifies one cached series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKey {
    pub ticker: String,
    pub interval: Interval,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(ticker: impl Into<String>, interval: Interval, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            interval,
            start,
            end,
        }
    }
}

/// A cached series plus its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub series: PriceSeries,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry was fetched within the freshness window
    pub fn is_fresh(&self, max_age_hours: i64) -> bool {
        Utc::now() - self.fetched_at < chrono::Duration::hours(max_age_hours)
    }

    /// Whether the entry's range covers the requested range
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.key.start <= start && self.key.end >= end
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    key: CacheKey,
    fetched_at: DateTime<Utc>,
}

/// Explicit handle over one cache directory.
///
/// Passed to whoever needs the cache instead of living as process-wide
/// state, so tests can isolate themselves with a temporary root.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn data_path(&self, ticker: &str, interval: Interval) -> PathBuf {
        self.root.join(ticker).join(interval.to_filename())
    }

    fn meta_path(&self, ticker: &str, interval: Interval) -> PathBuf {
        self.root.join(ticker).join(interval.to_meta_filename())
    }

    /// Look up a cached series. Returns `Ok(None)` when no entry exists for
    /// the ticker/interval or its recorded key does not match.
    pub fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let meta = match self.read_meta(&key.ticker, key.interval)? {
            Some(meta) => meta,
            None => return Ok(None),
        };

        if meta.key != *key {
            tracing::debug!(
                ticker = %key.ticker,
                interval = %key.interval,
                "Cache key mismatch, treating as miss"
            );
            return Ok(None);
        }

        let data_path = self.data_path(&key.ticker, key.interval);
        if !data_path.exists() {
            return Ok(None);
        }

        let series = read_series_csv(&data_path)?;
        Ok(Some(CacheEntry {
            key: meta.key,
            series,
            fetched_at: meta.fetched_at,
        }))
    }

    /// Latest entry for a ticker/interval regardless of the requested range
    pub fn get_latest(&self, ticker: &str, interval: Interval) -> Result<Option<CacheEntry>> {
        let meta = match self.read_meta(ticker, interval)? {
            Some(meta) => meta,
            None => return Ok(None),
        };

        let data_path = self.data_path(ticker, interval);
        if !data_path.exists() {
            return Ok(None);
        }

        let series = read_series_csv(&data_path)?;
        Ok(Some(CacheEntry {
            key: meta.key,
            series,
            fetched_at: meta.fetched_at,
        }))
    }

    /// Store a series, overwriting any previous entry for the key's
    /// ticker/interval. Storage failure is a `CacheWrite` error, which
    /// callers treat as fatal for the current run.
    pub fn put(&self, key: &CacheKey, series: &PriceSeries) -> Result<CacheEntry> {
        let dir = self.root.join(&key.ticker);
        fs::create_dir_all(&dir)
            .map_err(|e| Error::CacheWrite(format!("create {}: {}", dir.display(), e)))?;

        let data_path = self.data_path(&key.ticker, key.interval);
        write_series_csv(&data_path, series)
            .map_err(|e| Error::CacheWrite(format!("write {}: {}", data_path.display(), e)))?;

        let meta = CacheMeta {
            key: key.clone(),
            fetched_at: Utc::now(),
        };
        let meta_path = self.meta_path(&key.ticker, key.interval);
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| Error::CacheWrite(format!("serialize metadata: {}", e)))?;
        fs::write(&meta_path, meta_json)
            .map_err(|e| Error::CacheWrite(format!("write {}: {}", meta_path.display(), e)))?;

        tracing::debug!(
            ticker = %key.ticker,
            interval = %key.interval,
            records = series.len(),
            "Cached series"
        );

        Ok(CacheEntry {
            key: key.clone(),
            series: series.clone(),
            fetched_at: meta.fetched_at,
        })
    }

    /// Tickers present in the cache, sorted
    pub fn tickers(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut tickers = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    tickers.push(name.to_string());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    /// Load all cached series for an interval, keyed by ticker
    pub fn load_all(&self, interval: Interval) -> Result<std::collections::HashMap<String, PriceSeries>> {
        let mut map = std::collections::HashMap::new();

        for ticker in self.tickers()? {
            match self.get_latest(&ticker, interval) {
                Ok(Some(entry)) => {
                    map.insert(ticker, entry.series);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(ticker = %ticker, error = %e, "Skipping unreadable cache entry");
                }
            }
        }

        Ok(map)
    }

    fn read_meta(&self, ticker: &str, interval: Interval) -> Result<Option<CacheMeta>> {
        let meta_path = self.meta_path(ticker, interval);
        if !meta_path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&meta_path)?;
        match serde_json::from_str(&raw) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                // Unreadable metadata is a miss, not a hard error
                tracing::warn!(path = %meta_path.display(), error = %e, "Corrupt cache metadata");
                Ok(None)
            }
        }
    }
}

fn write_series_csv(path: &Path, series: &PriceSeries) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["time", "open", "high", "low", "close", "volume"])?;

    for candle in series.candles() {
        writer.write_record([
            candle.time.to_rfc3339(),
            candle.open.to_string(),
            candle.high.to_string(),
            candle.low.to_string(),
            candle.close.to_string(),
            candle.volume.to_string(),
        ])?;
    }

    writer.flush().map_err(|e| Error::Io(e.to_string()))?;
    Ok(())
}

fn read_series_csv(path: &Path) -> Result<PriceSeries> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut candles = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.len() < 6 {
            continue;
        }

        let time = parse_timestamp(&record[0])?;
        let candle = Candle::new(
            time,
            record[1]
                .parse()
                .map_err(|e| Error::Parse(format!("Invalid open: {}", e)))?,
            record[2]
                .parse()
                .map_err(|e| Error::Parse(format!("Invalid high: {}", e)))?,
            record[3]
                .parse()
                .map_err(|e| Error::Parse(format!("Invalid low: {}", e)))?,
            record[4]
                .parse()
                .map_err(|e| Error::Parse(format!("Invalid close: {}", e)))?,
            record[5]
                .parse()
                .map_err(|e| Error::Parse(format!("Invalid volume: {}", e)))?,
        );
        candles.push(candle);
    }

    Ok(PriceSeries::from_candles(candles))
}

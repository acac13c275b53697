//! One-shot fetch-and-cache pass over the ticker universe.
//!
//! Tickers are processed in fixed-size chunks of concurrently spawned
//! fetch tasks, which bounds resource usage during a pass. A per-ticker
//! fetch failure is logged and counted, and the pass carries on with the
//! remaining tickers unless `abort_on_failure` is set. Cache storage
//! failure always aborts the run.

use futures::future::join_all;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Candle, Interval, PriceSeries, UpdateConfig, UpdateStats};
use crate::services::cache::{CacheKey, CacheStore};
use crate::services::yahoo::{HistoryProvider, YahooError};

pub struct DataUpdater {
    provider: Arc<dyn HistoryProvider>,
    cache: CacheStore,
    config: UpdateConfig,
}

impl DataUpdater {
    pub fn new(provider: Arc<dyn HistoryProvider>, cache: CacheStore, config: UpdateConfig) -> Self {
        Self {
            provider,
            cache,
            config,
        }
    }

    /// Run a single fetch-and-cache pass over `tickers` for every
    /// configured interval.
    pub async fn run_once(&self, tickers: &[String]) -> Result<UpdateStats> {
        let mut totals = UpdateStats::new();

        for &interval in &self.config.intervals {
            let (stats, aborted) = self.run_interval(tickers, interval).await?;
            totals.merge(&stats);

            if aborted {
                tracing::error!(
                    interval = %interval,
                    processed = totals.total_processed(),
                    "Aborting pass after failure (abort-on-failure enabled)"
                );
                return Ok(totals);
            }
        }

        Ok(totals)
    }

    async fn run_interval(
        &self,
        tickers: &[String],
        interval: Interval,
    ) -> Result<(UpdateStats, bool)> {
        let mut stats = UpdateStats::new();
        let chunk_size = self.config.concurrent_fetches.max(1);

        tracing::info!(
            interval = %interval,
            tickers = tickers.len(),
            chunk_size = chunk_size,
            "Starting updater pass"
        );

        for chunk in tickers.chunks(chunk_size) {
            let to_fetch = self.filter_cached(chunk, interval, &mut stats);
            let results = self.fetch_chunk(&to_fetch, interval).await;
            let mut aborted = false;

            for (ticker, result) in results {
                match result {
                    Ok(candles) => {
                        let series = PriceSeries::from_candles(candles);
                        let key = CacheKey::new(
                            &ticker,
                            interval,
                            self.config.start_date,
                            self.config.end_date,
                        );
                        // CacheWrite is fatal for the whole run
                        self.cache.put(&key, &series)?;
                        stats.successful += 1;
                        stats.records_written += series.len();
                    }
                    Err(e) => {
                        tracing::warn!(ticker = %ticker, error = %e, "Fetch failed, skipping ticker");
                        stats.failed += 1;
                        if self.config.abort_on_failure {
                            aborted = true;
                        }
                    }
                }
            }

            if aborted {
                return Ok((stats, true));
            }
        }

        tracing::info!(
            interval = %interval,
            successful = stats.successful,
            failed = stats.failed,
            skipped = stats.skipped,
            "Updater pass for interval completed"
        );

        Ok((stats, false))
    }

    /// Split out tickers whose cache entry is fresh and covers the range
    fn filter_cached(
        &self,
        chunk: &[String],
        interval: Interval,
        stats: &mut UpdateStats,
    ) -> Vec<String> {
        if self.config.force {
            return chunk.to_vec();
        }

        let mut to_fetch = Vec::with_capacity(chunk.len());
        for ticker in chunk {
            let cached = self
                .cache
                .get_latest(ticker, interval)
                .ok()
                .flatten()
                .filter(|entry| {
                    entry.is_fresh(self.config.max_age_hours)
                        && entry.covers(self.config.start_date, self.config.end_date)
                });

            match cached {
                Some(_) => {
                    tracing::debug!(ticker = %ticker, interval = %interval, "Fresh cache hit, skipping fetch");
                    stats.skipped += 1;
                }
                None => to_fetch.push(ticker.clone()),
            }
        }
        to_fetch
    }

    async fn fetch_chunk(
        &self,
        tickers: &[String],
        interval: Interval,
    ) -> Vec<(String, std::result::Result<Vec<Candle>, YahooError>)> {
        let mut tasks = Vec::with_capacity(tickers.len());

        for ticker in tickers {
            let provider = Arc::clone(&self.provider);
            let ticker = ticker.clone();
            let start = self.config.start_date;
            let end = self.config.end_date;

            tasks.push(tokio::spawn(async move {
                let result = provider.get_history(&ticker, start, end, interval).await;
                (ticker, result)
            }));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for joined in join_all(tasks).await {
            match joined {
                Ok(pair) => results.push(pair),
                Err(e) => {
                    tracing::error!(error = %e, "Fetch task panicked");
                }
            }
        }
        results
    }
}

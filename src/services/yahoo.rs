//! Yahoo Finance chart API client for NSE price history.
//!
//! NSE equities are quoted on Yahoo with an `.NS` suffix (RELIANCE.NS),
//! while index symbols start with `^` (^NSEI) and pass through unchanged.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use isahc::config::Configurable;
use isahc::{AsyncReadResponseExt, HttpClient};
use serde_json::Value;
use std::time::{Duration as StdDuration, SystemTime};
use tokio::sync::Mutex as TokioMutex;
use tokio::time::sleep;

use crate::constants::{MAX_RETRIES, RATE_LIMIT_PER_MINUTE, REQUEST_TIMEOUT_SECS};
use crate::models::{Candle, Interval, PriceSeries};

#[derive(Debug)]
pub enum YahooError {
    Http(isahc::Error),
    Serialization(serde_json::Error),
    InvalidResponse(String),
    UnknownSymbol(String),
    RateLimit,
    NoData(String),
}

impl From<isahc::Error> for YahooError {
    fn from(error: isahc::Error) -> Self {
        YahooError::Http(error)
    }
}

impl From<serde_json::Error> for YahooError {
    fn from(error: serde_json::Error) -> Self {
        YahooError::Serialization(error)
    }
}

impl std::fmt::Display for YahooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YahooError::Http(e) => write!(f, "HTTP error: {}", e),
            YahooError::Serialization(e) => write!(f, "Serialization error: {}", e),
            YahooError::InvalidResponse(s) => write!(f, "Invalid response: {}", s),
            YahooError::UnknownSymbol(s) => write!(f, "Unknown symbol: {}", s),
            YahooError::RateLimit => write!(f, "Rate limit exceeded"),
            YahooError::NoData(s) => write!(f, "No data available: {}", s),
        }
    }
}

impl std::error::Error for YahooError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            YahooError::Http(e) => Some(e),
            YahooError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

/// Anything that can fetch a price history for a symbol.
///
/// The updater works against this trait so tests can inject failures
/// without touching the network.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<Candle>, YahooError>;
}

/// Sliding-window rate limiter shared across concurrent fetch tasks
#[derive(Debug)]
struct RateLimiter {
    request_timestamps: TokioMutex<Vec<SystemTime>>,
    rate_limit_per_minute: u32,
}

impl RateLimiter {
    fn new(rate_limit_per_minute: u32) -> Self {
        Self {
            request_timestamps: TokioMutex::new(Vec::new()),
            rate_limit_per_minute,
        }
    }

    async fn enforce(&self) {
        let current_time = SystemTime::now();
        let mut timestamps = self.request_timestamps.lock().await;

        // Drop timestamps older than one minute
        timestamps.retain(|&timestamp| {
            current_time
                .duration_since(timestamp)
                .unwrap_or(StdDuration::from_secs(0))
                < StdDuration::from_secs(60)
        });

        if timestamps.len() >= self.rate_limit_per_minute as usize {
            if let Some(&oldest_request) = timestamps.first() {
                let wait_time = StdDuration::from_secs(60)
                    - current_time
                        .duration_since(oldest_request)
                        .unwrap_or(StdDuration::from_secs(0));

                if !wait_time.is_zero() {
                    // Drop the lock before sleeping so other tasks can check
                    drop(timestamps);
                    sleep(wait_time + StdDuration::from_millis(100)).await;
                    let mut timestamps = self.request_timestamps.lock().await;
                    timestamps.push(current_time);
                    return;
                }
            }
        }

        timestamps.push(current_time);
    }
}

pub struct YahooClient {
    client: HttpClient,
    base_url: String,
    user_agents: Vec<String>,
    random_agent: bool,
    rate_limiter: RateLimiter,
}

/// Map an NSE ticker to its Yahoo symbol.
///
/// Indices (`^NSEI`) and already-suffixed symbols pass through; bare NSE
/// equity symbols get the `.NS` suffix.
pub fn to_yahoo_symbol(ticker: &str) -> String {
    if ticker.starts_with('^') || ticker.contains('.') {
        ticker.to_string()
    } else {
        format!("{}.NS", ticker)
    }
}

impl YahooClient {
    pub fn new(random_agent: bool) -> Result<Self, YahooError> {
        Self::with_rate_limit(random_agent, RATE_LIMIT_PER_MINUTE)
    }

    pub fn with_rate_limit(random_agent: bool, rate_limit_per_minute: u32) -> Result<Self, YahooError> {
        let client = HttpClient::builder()
            .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        Ok(Self {
            client,
            base_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            user_agents,
            random_agent,
            rate_limiter: RateLimiter::new(rate_limit_per_minute),
        })
    }

    fn get_user_agent(&self) -> &str {
        if self.random_agent {
            use rand::seq::SliceRandom;
            self.user_agents
                .choose(&mut rand::thread_rng())
                .unwrap_or(&self.user_agents[0])
        } else {
            &self.user_agents[0]
        }
    }

    fn build_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate, interval: Interval) -> Result<String, YahooError> {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| YahooError::InvalidResponse("Invalid start date".to_string()))?
            .and_utc()
            .timestamp();
        let period2 = end
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| YahooError::InvalidResponse("Invalid end date".to_string()))?
            .and_utc()
            .timestamp();

        Ok(format!(
            "{}/{}?period1={}&period2={}&interval={}&events=history",
            self.base_url,
            symbol,
            period1,
            period2,
            interval.to_yahoo_format()
        ))
    }

    async fn make_request(&self, url: &str, symbol: &str) -> Result<Value, YahooError> {
        let mut last_error: Option<String> = None;

        for attempt in 0..MAX_RETRIES {
            self.rate_limiter.enforce().await;

            if attempt > 0 {
                let delay = StdDuration::from_secs_f64(
                    2.0_f64.powi(attempt as i32 - 1) + rand::random::<f64>(),
                );
                let reason = last_error.as_deref().unwrap_or("unknown error");
                tracing::info!(
                    symbol = symbol,
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    reason = reason,
                    delay_s = delay.as_secs_f64(),
                    "Retry backoff before next attempt"
                );
                sleep(delay).await;
            }

            let request = isahc::Request::builder()
                .uri(url)
                .method("GET")
                .header("Accept", "application/json, text/plain, */*")
                .header("Accept-Language", "en-US,en;q=0.9")
                .header("Connection", "keep-alive")
                .header("User-Agent", self.get_user_agent())
                .body(())
                .map_err(|e| YahooError::InvalidResponse(format!("Request build error: {}", e)))?;

            match self.client.send_async(request).await {
                Ok(mut resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let text = match resp.text().await {
                            Ok(text) => text,
                            Err(e) => {
                                last_error = Some(format!("Response body error: {}", e));
                                continue;
                            }
                        };
                        match serde_json::from_str::<Value>(&text) {
                            Ok(data) => return Ok(data),
                            Err(e) => {
                                last_error = Some(format!("JSON parse error: {}", e));
                                continue;
                            }
                        }
                    } else if status == 404 {
                        // Yahoo answers 404 for symbols it does not know
                        return Err(YahooError::UnknownSymbol(symbol.to_string()));
                    } else if status == 429 {
                        last_error = Some("Too Many Requests (429)".to_string());
                        continue;
                    } else if status.is_server_error() {
                        last_error = Some(format!("Server error ({})", status.as_u16()));
                        continue;
                    } else {
                        return Err(YahooError::InvalidResponse(format!(
                            "Client error ({}) - not retryable",
                            status.as_u16()
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(format!("Network error: {}", e));
                    continue;
                }
            }
        }

        Err(YahooError::InvalidResponse(format!(
            "Max retries exceeded: {}",
            last_error.unwrap_or_else(|| "unknown error".to_string())
        )))
    }

    /// Extract candles from a chart API response.
    ///
    /// Rows with null values (holidays, partial sessions) are skipped.
    fn parse_chart_response(symbol: &str, response: &Value) -> Result<Vec<Candle>, YahooError> {
        let chart = response
            .get("chart")
            .ok_or_else(|| YahooError::InvalidResponse("Missing 'chart' field".to_string()))?;

        if let Some(error) = chart.get("error") {
            if !error.is_null() {
                let description = error
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("provider error");
                return Err(YahooError::UnknownSymbol(format!(
                    "{}: {}",
                    symbol, description
                )));
            }
        }

        let result = chart
            .get("result")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first())
            .ok_or_else(|| YahooError::NoData(symbol.to_string()))?;

        let timestamps = result
            .get("timestamp")
            .and_then(|t| t.as_array())
            .ok_or_else(|| YahooError::NoData(symbol.to_string()))?;

        let quote = result
            .pointer("/indicators/quote/0")
            .ok_or_else(|| YahooError::InvalidResponse("Missing quote indicators".to_string()))?;

        let field = |name: &str| -> Result<&Vec<Value>, YahooError> {
            quote
                .get(name)
                .and_then(|v| v.as_array())
                .ok_or_else(|| YahooError::InvalidResponse(format!("Missing '{}' array", name)))
        };

        let opens = field("open")?;
        let highs = field("high")?;
        let lows = field("low")?;
        let closes = field("close")?;
        let volumes = field("volume")?;

        let mut candles = Vec::with_capacity(timestamps.len());

        for (i, ts) in timestamps.iter().enumerate() {
            let Some(secs) = ts.as_i64() else { continue };
            let Some(time) = DateTime::<Utc>::from_timestamp(secs, 0) else {
                continue;
            };

            let values = (
                opens.get(i).and_then(|v| v.as_f64()),
                highs.get(i).and_then(|v| v.as_f64()),
                lows.get(i).and_then(|v| v.as_f64()),
                closes.get(i).and_then(|v| v.as_f64()),
            );

            if let (Some(open), Some(high), Some(low), Some(close)) = values {
                let volume = volumes.get(i).and_then(|v| v.as_u64()).unwrap_or(0);
                candles.push(Candle::new(time, open, high, low, close, volume));
            }
        }

        if candles.is_empty() {
            return Err(YahooError::NoData(symbol.to_string()));
        }

        Ok(candles)
    }
}

#[async_trait]
impl HistoryProvider for YahooClient {
    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<Candle>, YahooError> {
        let yahoo_symbol = to_yahoo_symbol(symbol);
        let url = self.build_url(&yahoo_symbol, start, end, interval)?;

        tracing::debug!(
            symbol = symbol,
            yahoo_symbol = %yahoo_symbol,
            start = %start,
            end = %end,
            interval = %interval,
            "Fetching price history"
        );

        let response = self.make_request(&url, &yahoo_symbol).await?;
        let candles = Self::parse_chart_response(&yahoo_symbol, &response)?;

        // Normalize so downstream code can rely on the ordering invariant
        let series = PriceSeries::from_candles(candles);
        tracing::debug!(symbol = symbol, record_count = series.len(), "Fetched records");

        Ok(series.candles().to_vec())
    }
}

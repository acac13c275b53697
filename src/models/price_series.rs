use chrono::Datelike;

use crate::models::Candle;

/// An ordered price history for a single ticker.
///
/// Construction normalizes the input: candles are sorted by timestamp and
/// duplicate timestamps are dropped, keeping the last occurrence. After
/// construction the series is read-only, so the strictly-increasing
/// timestamp invariant holds for the series' whole lifetime.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// Build a series from raw candles, sorting and deduplicating by timestamp
    pub fn from_candles(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.time);
        // Keep the last candle for a repeated timestamp (later fetches win)
        candles.reverse();
        candles.dedup_by_key(|c| c.time);
        candles.reverse();
        Self { candles }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Closing prices in timestamp order
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Resample daily candles into calendar-week buckets.
    ///
    /// Open is the first open of the week, high/low are the extremes, close
    /// is the last close, volume is summed. The bucket keeps the timestamp
    /// of its last candle, so the result stays strictly increasing.
    pub fn resample_weekly(&self) -> PriceSeries {
        let mut weekly: Vec<Candle> = Vec::new();
        let mut current_week: Option<(i32, u32)> = None;

        for candle in &self.candles {
            let iso = candle.time.iso_week();
            let week_key = (iso.year(), iso.week());

            if current_week == Some(week_key) {
                if let Some(bucket) = weekly.last_mut() {
                    bucket.high = bucket.high.max(candle.high);
                    bucket.low = bucket.low.min(candle.low);
                    bucket.close = candle.close;
                    bucket.volume += candle.volume;
                    bucket.time = candle.time;
                    continue;
                }
            }

            weekly.push(candle.clone());
            current_week = Some(week_key);
        }

        PriceSeries { candles: weekly }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(day: u32, close: f64) -> Candle {
        let time = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        Candle::new(time, close, close, close, close, 100)
    }

    fn times(series: &PriceSeries) -> Vec<chrono::DateTime<Utc>> {
        series.candles().iter().map(|c| c.time).collect()
    }

    #[test]
    fn test_from_candles_sorts_by_time() {
        let series = PriceSeries::from_candles(vec![candle(3, 30.0), candle(1, 10.0), candle(2, 20.0)]);

        let times = times(&series);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(series.closes(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_from_candles_dedups_keeping_last() {
        let series = PriceSeries::from_candles(vec![candle(1, 10.0), candle(2, 20.0), candle(2, 25.0)]);

        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.0, 25.0]);
    }

    #[test]
    fn test_strictly_increasing_invariant() {
        let mut input = Vec::new();
        for day in [5, 1, 3, 1, 2, 5, 4] {
            input.push(candle(day, day as f64));
        }
        let series = PriceSeries::from_candles(input);

        let times = times(&series);
        assert_eq!(times.len(), 5);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_resample_weekly() {
        // 2024-01-01 is a Monday; days 1-5 are one ISO week, day 8 the next
        let mut input = Vec::new();
        for day in 1..=5 {
            let time = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
            input.push(Candle::new(time, day as f64, day as f64 + 1.0, day as f64 - 1.0, day as f64, 10));
        }
        input.push(candle(8, 50.0));

        let weekly = PriceSeries::from_candles(input).resample_weekly();

        assert_eq!(weekly.len(), 2);
        let first = &weekly.candles()[0];
        assert_eq!(first.open, 1.0);
        assert_eq!(first.close, 5.0);
        assert_eq!(first.high, 6.0);
        assert_eq!(first.low, 0.0);
        assert_eq!(first.volume, 50);
        assert_eq!(weekly.candles()[1].close, 50.0);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::from_candles(Vec::new());
        assert!(series.is_empty());
        assert!(series.last().is_none());
        assert!(series.resample_weekly().is_empty());
    }
}

//! Simple and weighted moving averages over closing prices.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::PriceSeries;

/// Moving average flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaKind {
    /// Arithmetic mean of the window
    Simple,
    /// Linearly increasing weights, most recent observation weighted highest
    Weighted,
}

impl MaKind {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "simple" | "sma" => Ok(MaKind::Simple),
            "weighted" | "wma" => Ok(MaKind::Weighted),
            _ => Err(format!("Invalid MA kind: {}. Valid options: simple, weighted", s)),
        }
    }
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaKind::Simple => write!(f, "simple"),
            MaKind::Weighted => write!(f, "weighted"),
        }
    }
}

/// Moving average values aligned with the source series.
///
/// `values[i]` corresponds to the i-th candle of the input and is `None`
/// until at least `window` observations exist.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    pub values: Vec<Option<f64>>,
}

impl MovingAverage {
    /// Value at the final candle of the series, if defined
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Compute a trailing moving average over closing prices.
pub fn moving_average(series: &PriceSeries, window: usize, kind: MaKind) -> MovingAverage {
    let closes = series.closes();
    let mut values: Vec<Option<f64>> = vec![None; closes.len()];

    if window == 0 || closes.len() < window {
        return MovingAverage { values };
    }

    for i in (window - 1)..closes.len() {
        let start = i + 1 - window;
        let slice = &closes[start..=i];

        let value = match kind {
            MaKind::Simple => slice.iter().sum::<f64>() / window as f64,
            MaKind::Weighted => {
                // Weights 1..=window with the most recent close at `window`
                let weighted_sum: f64 = slice
                    .iter()
                    .enumerate()
                    .map(|(offset, close)| (offset + 1) as f64 * close)
                    .sum();
                let weight_total = (window * (window + 1)) as f64 / 2.0;
                weighted_sum / weight_total
            }
        };

        values[i] = Some(value);
    }

    MovingAverage { values }
}

/// Flag where the close sits below its moving average.
///
/// Returns (timestamp, below) pairs for every candle where the average is
/// defined; earlier candles are omitted.
pub fn below_average(series: &PriceSeries, ma: &MovingAverage) -> Vec<(DateTime<Utc>, bool)> {
    series
        .candles()
        .iter()
        .zip(ma.values.iter())
        .filter_map(|(candle, value)| value.map(|v| (candle.time, candle.close < v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use chrono::TimeZone;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let time = Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 0, 0, 0).unwrap();
                Candle::new(time, close, close, close, close, 100)
            })
            .collect();
        PriceSeries::from_candles(candles)
    }

    #[test]
    fn test_simple_ma() {
        let series = series_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let ma = moving_average(&series, 3, MaKind::Simple);

        assert_eq!(ma.values[0], None);
        assert_eq!(ma.values[1], None);
        assert_eq!(ma.values[2], Some(11.0));
        assert_eq!(ma.values[3], Some(12.0));
        assert_eq!(ma.values[5], Some(14.0));
        assert_eq!(ma.latest(), Some(14.0));
    }

    #[test]
    fn test_simple_ma_constant_series() {
        let series = series_from_closes(&[100.0; 10]);
        let ma = moving_average(&series, 5, MaKind::Simple);

        for (i, value) in ma.values.iter().enumerate() {
            if i < 4 {
                assert_eq!(*value, None);
            } else {
                assert_eq!(*value, Some(100.0));
            }
        }
    }

    #[test]
    fn test_weighted_ma_favors_recent() {
        let series = series_from_closes(&[10.0, 20.0, 30.0]);
        let ma = moving_average(&series, 3, MaKind::Weighted);

        // (1*10 + 2*20 + 3*30) / 6 = 140/6
        let expected = 140.0 / 6.0;
        assert!((ma.values[2].unwrap() - expected).abs() < 1e-9);

        let sma = moving_average(&series, 3, MaKind::Simple);
        assert!(ma.values[2].unwrap() > sma.values[2].unwrap());
    }

    #[test]
    fn test_window_larger_than_series() {
        let series = series_from_closes(&[10.0, 20.0]);
        let ma = moving_average(&series, 5, MaKind::Simple);
        assert!(ma.values.iter().all(|v| v.is_none()));
        assert_eq!(ma.latest(), None);
    }

    #[test]
    fn test_zero_window() {
        let series = series_from_closes(&[10.0, 20.0]);
        let ma = moving_average(&series, 0, MaKind::Simple);
        assert!(ma.values.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_below_average() {
        let series = series_from_closes(&[10.0, 20.0, 30.0, 5.0]);
        let ma = moving_average(&series, 3, MaKind::Simple);
        let flags = below_average(&series, &ma);

        // Defined at indices 2 and 3 only
        assert_eq!(flags.len(), 2);
        assert!(!flags[0].1); // 30 > 20
        assert!(flags[1].1); // 5 < (20+30+5)/3
    }

    #[test]
    fn test_ma_kind_parse() {
        assert_eq!(MaKind::parse("simple").unwrap(), MaKind::Simple);
        assert_eq!(MaKind::parse("WMA").unwrap(), MaKind::Weighted);
        assert!(MaKind::parse("exponential").is_err());
    }
}

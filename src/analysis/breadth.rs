//! Market breadth: how many tickers trade below their moving average.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::analysis::moving_average::{below_average, moving_average, MaKind};
use crate::models::PriceSeries;

/// One breadth observation across the ticker universe
#[derive(Debug, Clone, PartialEq)]
pub struct BreadthReport {
    /// Latest trading date across the evaluated series
    pub date: NaiveDate,

    /// Tickers whose latest close is below the moving average
    pub below: usize,

    /// Tickers with enough history for the average to be defined
    pub total: usize,

    /// below / total as a percentage
    pub pct_below: f64,
}

/// Count tickers whose latest close sits below their N-period moving average.
///
/// Tickers with fewer than `window` observations are excluded from the
/// denominator. Returns `None` when no ticker has enough history.
pub fn below_ma_breadth(
    series_by_ticker: &HashMap<String, PriceSeries>,
    window: usize,
    kind: MaKind,
) -> Option<BreadthReport> {
    let mut below = 0usize;
    let mut total = 0usize;
    let mut latest_date: Option<NaiveDate> = None;

    for series in series_by_ticker.values() {
        if series.len() < window {
            continue;
        }

        let ma = moving_average(series, window, kind);
        let flags = below_average(series, &ma);
        let Some(&(time, is_below)) = flags.last() else {
            continue;
        };

        total += 1;
        if is_below {
            below += 1;
        }

        let date = time.date_naive();
        latest_date = Some(latest_date.map_or(date, |d| d.max(date)));
    }

    let date = latest_date?;
    Some(BreadthReport {
        date,
        below,
        total,
        pct_below: (below as f64 / total as f64) * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use chrono::{TimeZone, Utc};

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
    fn test_breadth_counts_below() {
        let mut universe = HashMap::new();
        // Falling ticker: last close below its 3-period average
        universe.insert("FALL".to_string(), series_from_closes(&[30.0, 20.0, 10.0]));
        // Rising ticker: last close above its average
        universe.insert("RISE".to_string(), series_from_closes(&[10.0, 20.0, 30.0]));

        let report = below_ma_breadth(&universe, 3, MaKind::Simple).unwrap();

        assert_eq!(report.below, 1);
        assert_eq!(report.total, 2);
        assert!((report.pct_below - 50.0).abs() < 1e-9);
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn test_breadth_excludes_short_series() {
        let mut universe = HashMap::new();
        universe.insert("FULL".to_string(), series_from_closes(&[10.0, 20.0, 30.0]));
        universe.insert("SHORT".to_string(), series_from_closes(&[10.0]));

        let report = below_ma_breadth(&universe, 3, MaKind::Simple).unwrap();

        assert_eq!(report.total, 1);
    }

    #[test]
    fn test_breadth_empty_universe() {
        let universe: HashMap<String, PriceSeries> = HashMap::new();
        assert!(below_ma_breadth(&universe, 200, MaKind::Simple).is_none());

        let mut short_only = HashMap::new();
        short_only.insert("A".to_string(), series_from_closes(&[1.0, 2.0]));
        assert!(below_ma_breadth(&short_only, 200, MaKind::Simple).is_none());
    }

    #[test]
    fn test_breadth_weighted_kind() {
        let mut universe = HashMap::new();
        universe.insert("A".to_string(), series_from_closes(&[10.0, 20.0, 15.0]));

        let report = below_ma_breadth(&universe, 3, MaKind::Weighted).unwrap();

        // WMA = (1*10 + 2*20 + 3*15) / 6 = 95/6 ~ 15.83, close 15 is below
        assert_eq!(report.below, 1);
        assert_eq!(report.total, 1);
    }
}

//! Pointwise ratio of two aligned series and its rolling z-score.

use chrono::{DateTime, Utc};

use crate::models::PriceSeries;

/// Quotient of two series over their shared timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct RatioSeries {
    points: Vec<(DateTime<Utc>, f64)>,
}

impl RatioSeries {
    pub fn points(&self) -> &[(DateTime<Utc>, f64)] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<(DateTime<Utc>, f64)> {
        self.points.last().copied()
    }

    /// Arithmetic mean of all ratio values
    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.values().iter().sum::<f64>() / self.points.len() as f64)
    }

    /// Sample standard deviation of all ratio values
    pub fn std_dev(&self) -> Option<f64> {
        if self.points.len() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let sum_sq: f64 = self.values().iter().map(|v| (v - mean).powi(2)).sum();
        Some((sum_sq / (self.points.len() - 1) as f64).sqrt())
    }
}

/// Divide two series pointwise over the timestamps present in both.
///
/// Inner-join semantics: timestamps missing from either side produce no
/// point, and zero denominators are skipped rather than dividing.
pub fn ratio(numerator: &PriceSeries, denominator: &PriceSeries) -> RatioSeries {
    // Both sides are strictly increasing, so a two-pointer merge suffices
    let a = numerator.candles();
    let b = denominator.candles();
    let mut points = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].time.cmp(&b[j].time) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                if b[j].close != 0.0 {
                    points.push((a[i].time, a[i].close / b[j].close));
                }
                i += 1;
                j += 1;
            }
        }
    }

    RatioSeries { points }
}

/// Rolling z-score of a ratio series.
///
/// `result[i]` aligns with `ratio.points()[i]` and is `None` until `window`
/// observations exist or where the rolling standard deviation is zero (a
/// constant window yields no score rather than infinity or NaN).
pub fn zscore(ratio: &RatioSeries, window: usize) -> Vec<Option<f64>> {
    let values = ratio.values();
    let mut scores: Vec<Option<f64>> = vec![None; values.len()];

    if window < 2 || values.len() < window {
        return scores;
    }

    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let sum_sq: f64 = slice.iter().map(|v| (v - mean).powi(2)).sum();
        let std = (sum_sq / (window - 1) as f64).sqrt();

        if std > 0.0 {
            scores[i] = Some((values[i] - mean) / std);
        }
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use chrono::TimeZone;

    fn series(days_and_closes: &[(u32, f64)]) -> PriceSeries {
        let candles = days_and_closes
            .iter()
            .map(|&(day, close)| {
                let time = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
                Candle::new(time, close, close, close, close, 100)
            })
            .collect();
        PriceSeries::from_candles(candles)
    }

    #[test]
    fn test_ratio_inner_join() {
        let a = series(&[(1, 10.0), (2, 20.0), (3, 30.0)]);
        let b = series(&[(2, 2.0), (3, 3.0), (4, 4.0)]);

        let r = ratio(&a, &b);

        assert_eq!(r.len(), 2);
        assert_eq!(r.points()[0].1, 10.0);
        assert_eq!(r.points()[1].1, 10.0);
        let days: Vec<u32> = r
            .points()
            .iter()
            .map(|(t, _)| t.format("%d").to_string().parse().unwrap())
            .collect();
        assert_eq!(days, vec![2, 3]);
    }

    #[test]
    fn test_ratio_skips_zero_denominator() {
        let a = series(&[(1, 10.0), (2, 20.0), (3, 30.0)]);
        let b = series(&[(1, 2.0), (2, 0.0), (3, 3.0)]);

        let r = ratio(&a, &b);

        assert_eq!(r.len(), 2);
        assert_eq!(r.points()[0].1, 5.0);
        assert_eq!(r.points()[1].1, 10.0);
    }

    #[test]
    fn test_ratio_no_overlap() {
        let a = series(&[(1, 10.0), (2, 20.0)]);
        let b = series(&[(3, 1.0), (4, 1.0)]);
        assert!(ratio(&a, &b).is_empty());
    }

    #[test]
    fn test_zscore_constant_series_is_undefined() {
        let a = series(&[(1, 10.0), (2, 10.0), (3, 10.0), (4, 10.0), (5, 10.0)]);
        let b = series(&[(1, 2.0), (2, 2.0), (3, 2.0), (4, 2.0), (5, 2.0)]);
        let r = ratio(&a, &b);

        let scores = zscore(&r, 3);

        // Rolling std is zero everywhere: no NaN, no infinity, only None
        assert!(scores.iter().all(|s| s.is_none()));
    }

    #[test]
    fn test_zscore_values() {
        let a = series(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        let b = series(&[(1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0)]);
        let r = ratio(&a, &b);

        let scores = zscore(&r, 3);

        assert_eq!(scores[0], None);
        assert_eq!(scores[1], None);
        // Window [1,2,3]: mean 2, sample std 1, z = (3-2)/1 = 1
        assert!((scores[2].unwrap() - 1.0).abs() < 1e-9);
        assert!((scores[3].unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zscore_short_series() {
        let a = series(&[(1, 1.0), (2, 2.0)]);
        let b = series(&[(1, 1.0), (2, 1.0)]);
        let r = ratio(&a, &b);

        assert!(zscore(&r, 5).iter().all(|s| s.is_none()));
        assert!(zscore(&r, 1).iter().all(|s| s.is_none()));
    }

    #[test]
    fn test_ratio_stats() {
        let a = series(&[(1, 2.0), (2, 4.0), (3, 6.0)]);
        let b = series(&[(1, 1.0), (2, 1.0), (3, 1.0)]);
        let r = ratio(&a, &b);

        assert_eq!(r.mean(), Some(4.0));
        assert!((r.std_dev().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(r.last().unwrap().1, 6.0);
    }
}

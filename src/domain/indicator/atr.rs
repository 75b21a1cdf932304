//! Average True Range.
//!
//! TR[0] = high - low; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR(n)[i] = simple mean of TR over the last n bars.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    let tr: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            Some(if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            })
        })
        .collect();

    let raw = rolling_mean(&tr, period);
    IndicatorSeries::from_options(IndicatorType::Atr(period), bars, &raw, IndicatorValue::Simple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn atr_basic() {
        let bars: Vec<Bar> = (0..5).map(|i| make_bar(i + 1, 110.0, 90.0, 100.0)).collect();

        let series = calculate_atr(&bars, 3);
        assert_eq!(series.values.len(), 5);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert_eq!(series.simple(4), Some(20.0));
    }

    #[test]
    fn atr_is_rolling_mean_of_true_range() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
            make_bar(4, 140.0, 130.0, 135.0),
        ];

        let series = calculate_atr(&bars, 3);
        assert!((series.simple(2).unwrap() - 10.0).abs() < 1e-9);
        // TR[3] = max(10, |140-115|, |130-115|) = 25 → (10 + 10 + 25) / 3
        assert!((series.simple(3).unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars: Vec<Bar> = (0..2).map(|i| make_bar(i + 1, 110.0, 90.0, 100.0)).collect();

        let series = calculate_atr(&bars, 5);
        assert_eq!(series.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}

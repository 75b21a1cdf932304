//! Rolling standard deviation of closes.
//!
//! Sample standard deviation (divides by n - 1) over n closing prices.
//! Warmup: first (n-1) bars are invalid; a period below 2 is never valid.

use crate::domain::indicator::{
    closes, rolling_sample_std, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_stddev(bars: &[Bar], period: usize) -> IndicatorSeries {
    let raw = rolling_sample_std(&closes(bars), period);
    IndicatorSeries::from_options(
        IndicatorType::Stddev(period),
        bars,
        &raw,
        IndicatorValue::Simple,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<Bar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn stddev_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_stddev(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
    }

    #[test]
    fn stddev_known_value() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_stddev(&bars, 3);
        // mean 20, squared deviations 100 + 0 + 100, / 2 = 100
        assert!((series.simple(2).unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn stddev_constant_prices_is_zero() {
        let bars = make_bars(&[5.0, 5.0, 5.0, 5.0]);
        let series = calculate_stddev(&bars, 3);
        assert_eq!(series.simple(3), Some(0.0));
    }

    #[test]
    fn stddev_period_1_never_valid() {
        let bars = make_bars(&[5.0, 6.0]);
        let series = calculate_stddev(&bars, 1);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}

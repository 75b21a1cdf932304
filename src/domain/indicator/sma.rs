//! Simple Moving Average of closes.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{closes, rolling_mean, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_sma(bars: &[Bar], period: usize) -> IndicatorSeries {
    let raw = rolling_mean(&closes(bars), period);
    IndicatorSeries::from_options(IndicatorType::Sma(period), bars, &raw, IndicatorValue::Simple)
}

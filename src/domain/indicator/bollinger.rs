//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (width × StdDev)
//! - Lower: Middle - (width × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: period=20, width=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{
    closes, rolling_mean, rolling_sample_std, IndicatorPoint, IndicatorSeries, IndicatorType,
    IndicatorValue,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_bollinger(bars: &[Bar], period: usize, width_x100: u32) -> IndicatorSeries {
    let width = width_x100 as f64 / 100.0;
    let close = closes(bars);
    let middle = rolling_mean(&close, period);
    let stddev = rolling_sample_std(&close, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (valid, value) = match (middle[i], stddev[i]) {
                (Some(m), Some(sd)) => (
                    true,
                    IndicatorValue::Bands {
                        upper: m + width * sd,
                        middle: m,
                        lower: m - width * sd,
                    },
                ),
                _ => (
                    false,
                    IndicatorValue::Bands {
                        upper: 0.0,
                        middle: 0.0,
                        lower: 0.0,
                    },
                ),
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger { period, width_x100 },
        values,
    }
}

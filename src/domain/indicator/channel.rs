//! Prior-window price channel.
//!
//! CHANNEL(n)[i] = (max(H[i-n..i]), min(L[i-n..i])) over the n bars *before*
//! bar i. Bar i's own extremes never enter its reference levels, so a close
//! can be compared against them without look-ahead.
//! Warmup: first n bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_prior_channel(bars: &[Bar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::PriorChannel(period);
    let empty = IndicatorValue::Channel {
        upper: 0.0,
        lower: 0.0,
    };
    if period == 0 {
        return IndicatorSeries::invalid(indicator_type, bars, empty);
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i < period {
                return IndicatorPoint {
                    timestamp: bar.timestamp,
                    valid: false,
                    value: empty.clone(),
                };
            }
            let window = &bars[i - period..i];
            let upper = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lower = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Channel { upper, lower },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

//! KDJ stochastic oscillator.
//!
//! RSV[i] = (C[i] - LL) / (HH - LL) * 100 over the last n bars (50 when the
//! window has no range), K = SMA(RSV, k_period), D = SMA(K, d_period),
//! J = 3K - 2D.
//!
//! Default parameters: period=9, k_period=3, d_period=3
//! Warmup: period + k_period + d_period - 3 bars.

use crate::domain::indicator::{rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_kdj(bars: &[Bar], period: usize, k_period: usize, d_period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Kdj {
        period,
        k_period,
        d_period,
    };
    let empty = IndicatorValue::Kdj {
        k: 0.0,
        d: 0.0,
        j: 0.0,
    };
    if period == 0 || k_period == 0 || d_period == 0 {
        return IndicatorSeries::invalid(indicator_type, bars, empty);
    }

    let rsv: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i + 1 < period {
                return None;
            }
            let window = &bars[i + 1 - period..=i];
            let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let range = highest - lowest;
            Some(if range > 0.0 {
                (bar.close - lowest) / range * 100.0
            } else {
                50.0
            })
        })
        .collect();

    let k = rolling_mean(&rsv, k_period);
    let d = rolling_mean(&k, d_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (k[i], d[i]) {
            (Some(k), Some(d)) => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Kdj {
                    k,
                    d,
                    j: 3.0 * k - 2.0 * d,
                },
            },
            _ => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: false,
                value: empty.clone(),
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

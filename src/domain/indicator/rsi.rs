//! RSI (Relative Strength Index) indicator.
//!
//! Average gain/loss are simple rolling means of the last n close-to-close
//! changes (no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, or 50 when avg_gain is also 0 (flat window).
//!
//! Warmup: first n bars are invalid (need n price changes).

use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries::invalid(IndicatorType::Rsi(period), bars, IndicatorValue::Simple(0.0));
    }

    let mut gains: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    gains.push(None);
    losses.push(None);
    for w in bars.windows(2) {
        let change = w[1].close - w[0].close;
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let raw: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(g, l)| match (g, l) {
            (Some(g), Some(l)) => Some(rsi_value(*g, *l)),
            _ => None,
        })
        .collect();

    IndicatorSeries::from_options(IndicatorType::Rsi(period), bars, &raw, IndicatorValue::Simple)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, one point per bar
//!
//! Every indicator only reads bars up to and including the index it is
//! computing; points inside the warmup window are marked invalid.

pub mod atr;
pub mod bollinger;
pub mod channel;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use channel::calculate_prior_channel;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;
pub use stochastic::calculate_kdj;

use crate::domain::ohlcv::Bar;
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Kdj {
        k: f64,
        d: f64,
        j: f64,
    },
    Bands {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Channel {
        upper: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Stddev(usize),
    Rsi(usize),
    Atr(usize),
    PriorChannel(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Kdj {
        period: usize,
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        width_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// A series of invalid points, one per bar.
    pub(crate) fn invalid(indicator_type: IndicatorType, bars: &[Bar], value: IndicatorValue) -> Self {
        let values = bars
            .iter()
            .map(|b| IndicatorPoint {
                timestamp: b.timestamp,
                valid: false,
                value: value.clone(),
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    /// Builds a series from per-bar optional values; `None` is invalid.
    pub(crate) fn from_options<F>(
        indicator_type: IndicatorType,
        bars: &[Bar],
        raw: &[Option<f64>],
        wrap: F,
    ) -> Self
    where
        F: Fn(f64) -> IndicatorValue,
    {
        let values = bars
            .iter()
            .zip(raw)
            .map(|(b, v)| IndicatorPoint {
                timestamp: b.timestamp,
                valid: v.is_some(),
                value: wrap(v.unwrap_or(0.0)),
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at `index` if it is valid.
    pub fn point(&self, index: usize) -> Option<&IndicatorValue> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| &p.value)
    }

    /// The scalar at `index` if the point is valid and `Simple`.
    pub fn simple(&self, index: usize) -> Option<f64> {
        match self.point(index) {
            Some(IndicatorValue::Simple(v)) => Some(*v),
            _ => None,
        }
    }

    /// Number of leading invalid points.
    #[cfg(test)]
    pub(crate) fn warmup(&self) -> usize {
        self.values
            .iter()
            .position(|p| p.valid)
            .unwrap_or(self.values.len())
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::PriorChannel(period) => write!(f, "CHANNEL({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Kdj {
                period,
                k_period,
                d_period,
            } => write!(f, "KDJ({},{},{})", period, k_period, d_period),
            IndicatorType::Bollinger { period, width_x100 } => {
                let width = *width_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, width)
            }
        }
    }
}

/// Rolling mean over `period` entries; `None` unless every entry in the
/// window is present.
pub(crate) fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |window| {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    })
}

/// Rolling sample standard deviation (divides by n - 1).
pub(crate) fn rolling_sample_std(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |window| {
        if window.len() < 2 {
            return None;
        }
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(var.sqrt())
    })
}

/// Exponential average with k = 2/(n+1), seeded by the simple mean of the
/// first `period` present values. Leading `None`s are skipped; a `None`
/// after the seed resets nothing and yields `None`.
pub(crate) fn seeded_ema(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut seed_sum = 0.0;
    let mut seen = 0usize;
    let mut ema: Option<f64> = None;

    for (i, v) in values.iter().enumerate() {
        let Some(v) = *v else {
            continue;
        };
        match ema {
            None => {
                seed_sum += v;
                seen += 1;
                if seen == period {
                    let seed = seed_sum / period as f64;
                    ema = Some(seed);
                    out[i] = Some(seed);
                }
            }
            Some(prev) => {
                let next = v * k + prev * (1.0 - k);
                ema = Some(next);
                out[i] = Some(next);
            }
        }
    }
    out
}

fn rolling<F>(values: &[Option<f64>], period: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    let mut window: Vec<f64> = Vec::with_capacity(period);
    for i in (period - 1)..values.len() {
        window.clear();
        for v in &values[i + 1 - period..=i] {
            match v {
                Some(x) => window.push(*x),
                None => break,
            }
        }
        if window.len() == period {
            out[i] = reduce(&window);
        }
    }
    out
}

pub(crate) fn closes(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter().map(|b| Some(b.close)).collect()
}

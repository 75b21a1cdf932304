//! Z-score mean reversion, long and short.
//!
//! Bands are `mean ± threshold·σ` over a rolling window of closes (sample
//! standard deviation). Entries fire on crossing the outer band, exits on
//! crossing the inner band on the far side of the mean. A move beyond
//! `1.5·entry_threshold` standard deviations forces both sides flat.

use super::{combine, crossed_above, crossed_below, Signal};
use crate::domain::indicator::{calculate_sma, calculate_stddev};
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;

const STOP_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct MeanReversionParams {
    pub period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            period: 20,
            entry_threshold: 2.0,
            exit_threshold: 0.5,
        }
    }
}

impl MeanReversionParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        let defaults = Self::default();
        Self {
            period: params.window("period", defaults.period, 2),
            entry_threshold: params.positive("entry_threshold", defaults.entry_threshold),
            exit_threshold: params.non_negative("exit_threshold", defaults.exit_threshold),
        }
    }

    pub fn to_params(&self) -> ParameterSet {
        ParameterSet::new()
            .with("period", self.period as f64)
            .with("entry_threshold", self.entry_threshold)
            .with("exit_threshold", self.exit_threshold)
    }

    pub fn warmup(&self) -> usize {
        self.period
    }

    pub fn signals(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let mean = calculate_sma(bars, self.period);
        let stddev = calculate_stddev(bars, self.period);
        let stats = |i: usize| Some((mean.simple(i)?, stddev.simple(i)?));

        (0..bars.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let ((prev_mean, prev_sd), (m, sd)) = (stats(i - 1)?, stats(i)?);
                let (prev_close, close) = (bars[i - 1].close, bars[i].close);

                if sd > 0.0 && ((close - m) / sd).abs() > STOP_FACTOR * self.entry_threshold {
                    return Some(Signal::Flat);
                }

                let band = |mean: f64, sd: f64, k: f64| (mean - k * sd, mean + k * sd);
                let (prev_entry_lo, prev_entry_hi) = band(prev_mean, prev_sd, self.entry_threshold);
                let (entry_lo, entry_hi) = band(m, sd, self.entry_threshold);
                let (prev_exit_lo, prev_exit_hi) = band(prev_mean, prev_sd, self.exit_threshold);
                let (exit_lo, exit_hi) = band(m, sd, self.exit_threshold);

                let long = if crossed_below(prev_close, prev_entry_lo, close, entry_lo) {
                    Some(Signal::Long)
                } else if crossed_above(prev_close, prev_exit_hi, close, exit_hi) {
                    Some(Signal::Flat)
                } else {
                    None
                };
                let short = if crossed_above(prev_close, prev_entry_hi, close, entry_hi) {
                    Some(Signal::Short)
                } else if crossed_below(prev_close, prev_exit_lo, close, exit_lo) {
                    Some(Signal::Flat)
                } else {
                    None
                };
                combine(long, short)
            })
            .collect()
    }
}

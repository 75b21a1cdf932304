//! Moving-average crossover.
//!
//! Long while the short mean sits above the long mean by more than
//! `min_gap` (relative to the long mean), flat while it sits below by more
//! than `min_gap`, unset inside the band. Forward fill in the resolver turns
//! the regime into flips at the crossings.

use super::Signal;
use crate::domain::indicator::calculate_sma;
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;

#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossoverParams {
    pub short_window: usize,
    pub long_window: usize,
    pub min_gap: f64,
}

impl Default for MaCrossoverParams {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            min_gap: 0.002,
        }
    }
}

impl MaCrossoverParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        let defaults = Self::default();
        let mut short_window = params.window("short_window", defaults.short_window, 1);
        let mut long_window = params.window("long_window", defaults.long_window, 2);
        if short_window >= long_window {
            tracing::debug!(short_window, long_window, "short window not below long window, using defaults");
            short_window = defaults.short_window;
            long_window = defaults.long_window;
        }
        Self {
            short_window,
            long_window,
            min_gap: params.non_negative("min_gap", defaults.min_gap),
        }
    }

    pub fn to_params(&self) -> ParameterSet {
        ParameterSet::new()
            .with("short_window", self.short_window as f64)
            .with("long_window", self.long_window as f64)
            .with("min_gap", self.min_gap)
    }

    pub fn warmup(&self) -> usize {
        self.long_window
    }

    pub fn signals(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let short = calculate_sma(bars, self.short_window);
        let long = calculate_sma(bars, self.long_window);

        (0..bars.len())
            .map(|i| {
                if i < self.warmup() {
                    return None;
                }
                let (s, l) = (short.simple(i)?, long.simple(i)?);
                if s > l * (1.0 + self.min_gap) {
                    Some(Signal::Long)
                } else if s < l * (1.0 - self.min_gap) {
                    Some(Signal::Flat)
                } else {
                    None
                }
            })
            .collect()
    }
}

//! MACD line / signal line crossover.
//!
//! A bullish cross opens a long and closes any short; a bearish cross opens
//! a short and closes any long.

use super::{combine, crossed_above, crossed_below, Signal};
use crate::domain::indicator::{calculate_macd, IndicatorValue};
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl MacdParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        let defaults = Self::default();
        let mut fast_period = params.window("fast_period", defaults.fast_period, 1);
        let mut slow_period = params.window("slow_period", defaults.slow_period, 2);
        if fast_period >= slow_period {
            tracing::debug!(fast_period, slow_period, "fast period not below slow period, using defaults");
            fast_period = defaults.fast_period;
            slow_period = defaults.slow_period;
        }
        Self {
            fast_period,
            slow_period,
            signal_period: params.window("signal_period", defaults.signal_period, 1),
        }
    }

    pub fn to_params(&self) -> ParameterSet {
        ParameterSet::new()
            .with("fast_period", self.fast_period as f64)
            .with("slow_period", self.slow_period as f64)
            .with("signal_period", self.signal_period as f64)
    }

    pub fn warmup(&self) -> usize {
        self.fast_period
            .max(self.slow_period)
            .saturating_add(self.signal_period)
            .saturating_sub(1)
    }

    pub fn signals(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let macd = calculate_macd(bars, self.fast_period, self.slow_period, self.signal_period);
        let lines = |i: usize| match macd.point(i) {
            Some(IndicatorValue::Macd { line, signal, .. }) => Some((*line, *signal)),
            _ => None,
        };

        (0..bars.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let ((prev_line, prev_signal), (line, signal)) = (lines(i - 1)?, lines(i)?);

                if crossed_above(prev_line, prev_signal, line, signal) {
                    combine(Some(Signal::Long), Some(Signal::Flat))
                } else if crossed_below(prev_line, prev_signal, line, signal) {
                    combine(Some(Signal::Flat), Some(Signal::Short))
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::bars_from_closes;

    fn first_index(signals: &[Option<Signal>], target: Signal, from: usize) -> Option<usize> {
        signals
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, s)| **s == Some(target))
            .map(|(i, _)| i)
    }

    #[test]
    fn bullish_then_bearish_cross() {
        // accelerating decline keeps the line under its signal, then a rally
        // and a selloff
        let mut closes: Vec<f64> = (0..10).map(|i| 30.0 - 0.2 * (i * i) as f64).collect();
        closes.extend((1..=6).map(|i| 13.8 + 3.0 * i as f64));
        closes.extend((1..=8).map(|i| 31.8 - 3.0 * i as f64));
        let bars = bars_from_closes(&closes);

        let params = MacdParams::from_params(
            &ParameterSet::new()
                .with("fast_period", 2.0)
                .with("slow_period", 4.0)
                .with("signal_period", 3.0),
        );
        assert_eq!(params.warmup(), 6);
        let signals = params.signals(&bars);

        assert!(signals[..6].iter().all(Option::is_none));
        assert!(signals[6..10].iter().all(|s| *s != Some(Signal::Long)));
        let long = first_index(&signals, Signal::Long, 6).expect("bullish cross in the rally");
        let short = first_index(&signals, Signal::Short, 16).expect("bearish cross in the selloff");
        assert!((10..16).contains(&long));
        assert!((16..24).contains(&short));
    }

    #[test]
    fn fast_not_below_slow_falls_back() {
        let params = MacdParams::from_params(
            &ParameterSet::new()
                .with("fast_period", 30.0)
                .with("slow_period", 26.0),
        );
        assert_eq!(params.fast_period, 12);
        assert_eq!(params.slow_period, 26);
        assert_eq!(params.warmup(), 34);
    }
}

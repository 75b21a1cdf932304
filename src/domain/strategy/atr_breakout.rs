//! ATR channel breakout.
//!
//! Reference levels come from the *prior* window: the highest high and
//! lowest low of the `atr_period` bars before the current one, padded by the
//! previous bar's ATR. The bar being tested never contributes to its own
//! threshold.

use super::{combine, crossed_above, crossed_below, Signal};
use crate::domain::indicator::{calculate_atr, calculate_prior_channel, IndicatorValue};
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;

#[derive(Debug, Clone, PartialEq)]
pub struct AtrBreakoutParams {
    pub atr_period: usize,
    pub entry_multiplier: f64,
    pub exit_multiplier: f64,
}

impl Default for AtrBreakoutParams {
    fn default() -> Self {
        Self {
            atr_period: 20,
            entry_multiplier: 2.0,
            exit_multiplier: 1.5,
        }
    }
}

/// Breakout and stop levels in force at one bar.
#[derive(Debug, Clone, Copy)]
struct Levels {
    long_entry: f64,
    long_exit: f64,
    short_entry: f64,
    short_exit: f64,
}

impl AtrBreakoutParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        let defaults = Self::default();
        Self {
            atr_period: params.window("atr_period", defaults.atr_period, 1),
            entry_multiplier: params.positive("entry_multiplier", defaults.entry_multiplier),
            exit_multiplier: params.non_negative("exit_multiplier", defaults.exit_multiplier),
        }
    }

    pub fn to_params(&self) -> ParameterSet {
        ParameterSet::new()
            .with("atr_period", self.atr_period as f64)
            .with("entry_multiplier", self.entry_multiplier)
            .with("exit_multiplier", self.exit_multiplier)
    }

    pub fn warmup(&self) -> usize {
        self.atr_period.saturating_add(1)
    }

    pub fn signals(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let atr = calculate_atr(bars, self.atr_period);
        let channel = calculate_prior_channel(bars, self.atr_period);

        let levels = |i: usize| -> Option<Levels> {
            let prev_atr = atr.simple(i.checked_sub(1)?)?;
            match channel.point(i) {
                Some(IndicatorValue::Channel { upper, lower }) => Some(Levels {
                    long_entry: upper + self.entry_multiplier * prev_atr,
                    long_exit: upper - self.exit_multiplier * prev_atr,
                    short_entry: lower - self.entry_multiplier * prev_atr,
                    short_exit: lower + self.exit_multiplier * prev_atr,
                }),
                _ => None,
            }
        };

        (0..bars.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let (prev, curr) = (levels(i - 1)?, levels(i)?);
                let (prev_close, close) = (bars[i - 1].close, bars[i].close);

                let long = if crossed_above(prev_close, prev.long_entry, close, curr.long_entry) {
                    Some(Signal::Long)
                } else if crossed_below(prev_close, prev.long_exit, close, curr.long_exit) {
                    Some(Signal::Flat)
                } else {
                    None
                };
                let short = if crossed_below(prev_close, prev.short_entry, close, curr.short_entry) {
                    Some(Signal::Short)
                } else if crossed_above(prev_close, prev.short_exit, close, curr.short_exit) {
                    Some(Signal::Flat)
                } else {
                    None
                };
                combine(long, short)
            })
            .collect()
    }
}

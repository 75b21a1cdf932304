//! KDJ stochastic crossover.
//!
//! Long when K crosses above D while K is still near the oversold zone
//! (`K < oversold + 10`); leave it when K crosses back below D or K runs
//! past `overbought`. The short side mirrors this around `overbought`.

use super::{combine, crossed_above, crossed_below, Signal};
use crate::domain::indicator::{calculate_kdj, IndicatorValue};
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;

const ZONE_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct KdjParams {
    pub period: usize,
    pub k_period: usize,
    pub d_period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for KdjParams {
    fn default() -> Self {
        Self {
            period: 9,
            k_period: 3,
            d_period: 3,
            overbought: 80.0,
            oversold: 20.0,
        }
    }
}

impl KdjParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        let defaults = Self::default();
        let mut overbought = params.level("overbought", defaults.overbought);
        let mut oversold = params.level("oversold", defaults.oversold);
        if oversold >= overbought {
            tracing::debug!(oversold, overbought, "oversold not below overbought, using defaults");
            overbought = defaults.overbought;
            oversold = defaults.oversold;
        }
        Self {
            period: params.window("period", defaults.period, 1),
            k_period: params.window("k_period", defaults.k_period, 1),
            d_period: params.window("d_period", defaults.d_period, 1),
            overbought,
            oversold,
        }
    }

    pub fn to_params(&self) -> ParameterSet {
        ParameterSet::new()
            .with("period", self.period as f64)
            .with("k_period", self.k_period as f64)
            .with("d_period", self.d_period as f64)
            .with("overbought", self.overbought)
            .with("oversold", self.oversold)
    }

    pub fn warmup(&self) -> usize {
        self.period
            .saturating_add(self.k_period)
            .saturating_add(self.d_period)
            .saturating_sub(2)
    }

    pub fn signals(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let kdj = calculate_kdj(bars, self.period, self.k_period, self.d_period);
        let kd = |i: usize| match kdj.point(i) {
            Some(IndicatorValue::Kdj { k, d, .. }) => Some((*k, *d)),
            _ => None,
        };

        (0..bars.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let ((prev_k, prev_d), (k, d)) = (kd(i - 1)?, kd(i)?);
                let golden = crossed_above(prev_k, prev_d, k, d);
                let dead = crossed_below(prev_k, prev_d, k, d);

                let long = if golden && k < self.oversold + ZONE_MARGIN {
                    Some(Signal::Long)
                } else if dead || k > self.overbought {
                    Some(Signal::Flat)
                } else {
                    None
                };
                let short = if dead && k > self.overbought - ZONE_MARGIN {
                    Some(Signal::Short)
                } else if golden || k < self.oversold {
                    Some(Signal::Flat)
                } else {
                    None
                };
                combine(long, short)
            })
            .collect()
    }
}

//! RSI reversal.
//!
//! Long when RSI crosses below `oversold`, leave the long when it crosses
//! back above 50. Short when RSI crosses above `overbought`, leave the short
//! when it crosses back below 50.

use super::{combine, crossed_above, crossed_below, Signal};
use crate::domain::indicator::calculate_rsi;
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;

const MIDLINE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RsiParams {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl RsiParams {
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
            overbought,
            oversold,
        }
    }

    pub fn to_params(&self) -> ParameterSet {
        ParameterSet::new()
            .with("period", self.period as f64)
            .with("overbought", self.overbought)
            .with("oversold", self.oversold)
    }

    pub fn warmup(&self) -> usize {
        self.period.saturating_add(1)
    }

    pub fn signals(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let rsi = calculate_rsi(bars, self.period);

        (0..bars.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let (prev, curr) = (rsi.simple(i - 1)?, rsi.simple(i)?);

                let long = if crossed_below(prev, self.oversold, curr, self.oversold) {
                    Some(Signal::Long)
                } else if crossed_above(prev, MIDLINE, curr, MIDLINE) {
                    Some(Signal::Flat)
                } else {
                    None
                };
                let short = if crossed_above(prev, self.overbought, curr, self.overbought) {
                    Some(Signal::Short)
                } else if crossed_below(prev, MIDLINE, curr, MIDLINE) {
                    Some(Signal::Flat)
                } else {
                    None
                };
                combine(long, short)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::bars_from_closes;

    fn params() -> RsiParams {
        RsiParams::from_params(&ParameterSet::new().with("period", 3.0))
    }

    #[test]
    fn long_on_cross_below_oversold() {
        // RSI(3): 100, 100, 66.7, 33.3, 0, 0 from index 3
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 13.0, 12.0, 11.0, 10.0]);
        let signals = params().signals(&bars);

        assert!(signals[..4].iter().all(Option::is_none));
        assert_eq!(signals[6], Some(Signal::Flat));
        assert_eq!(signals[7], Some(Signal::Long));
        assert_eq!(signals[8], None);
    }

    #[test]
    fn short_on_cross_above_overbought() {
        // RSI(3) falls to 0 then recovers through 50 and 70
        let bars = bars_from_closes(&[14.0, 13.0, 12.0, 11.0, 10.0, 11.0, 12.0, 13.0]);
        let signals = params().signals(&bars);
        // index 6: gains 1,1 loss 1 → 66.7 (crosses 50: long exit)
        assert_eq!(signals[6], Some(Signal::Flat));
        // index 7: 100 → crosses 70
        assert_eq!(signals[7], Some(Signal::Short));
    }

    #[test]
    fn inverted_levels_fall_back() {
        let p = RsiParams::from_params(
            &ParameterSet::new()
                .with("overbought", 20.0)
                .with("oversold", 60.0),
        );
        assert_eq!(p.overbought, 70.0);
        assert_eq!(p.oversold, 30.0);
        assert_eq!(p.warmup(), 15);
    }
}

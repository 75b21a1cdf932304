//! Long-only Bollinger band reversion: buy the dip below the lower band,
//! sell when the close recovers above the middle band.

use super::{crossed_above, crossed_below, Signal};
use crate::domain::indicator::{calculate_bollinger, IndicatorValue};
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;

#[derive(Debug, Clone, PartialEq)]
pub struct BandReversionParams {
    pub period: usize,
    pub band_width: f64,
}

impl Default for BandReversionParams {
    fn default() -> Self {
        Self {
            period: 20,
            band_width: 2.0,
        }
    }
}

impl BandReversionParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        let defaults = Self::default();
        Self {
            period: params.window("period", defaults.period, 2),
            band_width: params.positive("band_width", defaults.band_width),
        }
    }

    pub fn to_params(&self) -> ParameterSet {
        ParameterSet::new()
            .with("period", self.period as f64)
            .with("band_width", self.band_width)
    }

    pub fn warmup(&self) -> usize {
        self.period
    }

    pub fn signals(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let width_x100 = (self.band_width * 100.0).round() as u32;
        let bands = calculate_bollinger(bars, self.period, width_x100);
        let lower_middle = |i: usize| match bands.point(i) {
            Some(IndicatorValue::Bands { middle, lower, .. }) => Some((*lower, *middle)),
            _ => None,
        };

        (0..bars.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let ((prev_lower, prev_middle), (lower, middle)) =
                    (lower_middle(i - 1)?, lower_middle(i)?);
                let (prev_close, close) = (bars[i - 1].close, bars[i].close);

                if crossed_below(prev_close, prev_lower, close, lower) {
                    Some(Signal::Long)
                } else if crossed_above(prev_close, prev_middle, close, middle) {
                    Some(Signal::Flat)
                } else {
                    None
                }
            })
            .collect()
    }
}

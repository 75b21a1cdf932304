//! Signal generation.
//!
//! Each strategy variant is a pure function `(bars, params) -> signals`
//! selected by [`StrategyKind`]. A variant only reads bars up to and
//! including the index it decides on; the one-bar execution delay is
//! applied later by the position resolver.

pub mod atr_breakout;
pub mod band_reversion;
pub mod kdj;
pub mod ma_crossover;
pub mod macd;
pub mod mean_reversion;
pub mod rsi;

use crate::domain::error::{BacktestError, Diagnostic};
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A discrete directional decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Short,
    Flat,
    Long,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    /// Sign of `value`; anything positive is long, anything negative short.
    pub fn from_value(value: i8) -> Self {
        match value.signum() {
            1 => Signal::Long,
            -1 => Signal::Short,
            _ => Signal::Flat,
        }
    }
}

/// Raw per-bar signal. `None` means "unset": keep whatever was decided last.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub signals: Vec<Option<Signal>>,
    pub warmup: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MaCrossover,
    Rsi,
    Macd,
    Kdj,
    AtrBreakout,
    MeanReversion,
    BandReversion,
}

impl StrategyKind {
    pub fn all() -> &'static [StrategyKind] {
        &[
            StrategyKind::MaCrossover,
            StrategyKind::Rsi,
            StrategyKind::Macd,
            StrategyKind::Kdj,
            StrategyKind::AtrBreakout,
            StrategyKind::MeanReversion,
            StrategyKind::BandReversion,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::MaCrossover => "sma",
            StrategyKind::Rsi => "rsi",
            StrategyKind::Macd => "macd",
            StrategyKind::Kdj => "kdj",
            StrategyKind::AtrBreakout => "atr_breakout",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::BandReversion => "band_reversion",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::MaCrossover => "short/long moving average crossover with a relative gap filter",
            StrategyKind::Rsi => "RSI oversold/overbought reversal with midline exits",
            StrategyKind::Macd => "MACD line versus signal line crossover",
            StrategyKind::Kdj => "stochastic K/D crossover inside oversold/overbought bands",
            StrategyKind::AtrBreakout => "prior-window channel breakout padded by ATR",
            StrategyKind::MeanReversion => "z-score band entry with midline-side exits, long and short",
            StrategyKind::BandReversion => "long-only Bollinger lower band reversion",
        }
    }

    pub fn default_parameters(&self) -> ParameterSet {
        match self {
            StrategyKind::MaCrossover => ma_crossover::MaCrossoverParams::default().to_params(),
            StrategyKind::Rsi => rsi::RsiParams::default().to_params(),
            StrategyKind::Macd => macd::MacdParams::default().to_params(),
            StrategyKind::Kdj => kdj::KdjParams::default().to_params(),
            StrategyKind::AtrBreakout => atr_breakout::AtrBreakoutParams::default().to_params(),
            StrategyKind::MeanReversion => mean_reversion::MeanReversionParams::default().to_params(),
            StrategyKind::BandReversion => band_reversion::BandReversionParams::default().to_params(),
        }
    }

    /// Leading bars that cannot carry a decision under `params`.
    pub fn warmup(&self, params: &ParameterSet) -> usize {
        match self {
            StrategyKind::MaCrossover => ma_crossover::MaCrossoverParams::from_params(params).warmup(),
            StrategyKind::Rsi => rsi::RsiParams::from_params(params).warmup(),
            StrategyKind::Macd => macd::MacdParams::from_params(params).warmup(),
            StrategyKind::Kdj => kdj::KdjParams::from_params(params).warmup(),
            StrategyKind::AtrBreakout => atr_breakout::AtrBreakoutParams::from_params(params).warmup(),
            StrategyKind::MeanReversion => mean_reversion::MeanReversionParams::from_params(params).warmup(),
            StrategyKind::BandReversion => band_reversion::BandReversionParams::from_params(params).warmup(),
        }
    }

    /// Evaluate the variant over `bars`.
    ///
    /// With `bars.len() <= warmup` the result is all flat and carries an
    /// `InsufficientData` diagnostic instead of failing.
    pub fn generate(&self, bars: &[Bar], params: &ParameterSet) -> SignalSeries {
        let warmup = self.warmup(params);
        if bars.len() <= warmup {
            tracing::warn!(
                strategy = self.id(),
                bars = bars.len(),
                required = warmup,
                "insufficient data, emitting flat signal"
            );
            return SignalSeries {
                signals: vec![Some(Signal::Flat); bars.len()],
                warmup,
                diagnostics: vec![Diagnostic::InsufficientData {
                    bars: bars.len(),
                    required: warmup,
                }],
            };
        }

        let mut signals = match self {
            StrategyKind::MaCrossover => ma_crossover::MaCrossoverParams::from_params(params).signals(bars),
            StrategyKind::Rsi => rsi::RsiParams::from_params(params).signals(bars),
            StrategyKind::Macd => macd::MacdParams::from_params(params).signals(bars),
            StrategyKind::Kdj => kdj::KdjParams::from_params(params).signals(bars),
            StrategyKind::AtrBreakout => atr_breakout::AtrBreakoutParams::from_params(params).signals(bars),
            StrategyKind::MeanReversion => mean_reversion::MeanReversionParams::from_params(params).signals(bars),
            StrategyKind::BandReversion => band_reversion::BandReversionParams::from_params(params).signals(bars),
        };
        for s in signals.iter_mut().take(warmup) {
            *s = None;
        }

        SignalSeries {
            signals,
            warmup,
            diagnostics: Vec::new(),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for StrategyKind {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" | "ma" | "ma_crossover" => Ok(StrategyKind::MaCrossover),
            "rsi" => Ok(StrategyKind::Rsi),
            "macd" => Ok(StrategyKind::Macd),
            "kdj" => Ok(StrategyKind::Kdj),
            "atr_breakout" | "atr" => Ok(StrategyKind::AtrBreakout),
            "mean_reversion" => Ok(StrategyKind::MeanReversion),
            "band_reversion" | "bollinger" => Ok(StrategyKind::BandReversion),
            _ => Err(BacktestError::UnsupportedStrategy {
                name: s.to_string(),
            }),
        }
    }
}

/// Look up `strategy_id` and evaluate it.
pub fn generate(
    strategy_id: &str,
    bars: &[Bar],
    params: &ParameterSet,
) -> Result<SignalSeries, BacktestError> {
    let kind: StrategyKind = strategy_id.parse()?;
    Ok(kind.generate(bars, params))
}

pub(crate) fn crossed_above(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a <= prev_b && a > b
}

pub(crate) fn crossed_below(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a >= prev_b && a < b
}

/// Merge the long leg (`Long`/`Flat`/unset) with the short leg
/// (`Short`/`Flat`/unset) by summing their values.
pub(crate) fn combine(long: Option<Signal>, short: Option<Signal>) -> Option<Signal> {
    match (long, short) {
        (None, None) => None,
        (l, s) => {
            let sum = l.map_or(0, Signal::value) + s.map_or(0, Signal::value);
            Some(Signal::from_value(sum))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::ohlcv::Bar;
    use chrono::{Duration, NaiveDate};

    /// Hourly bars with high/low one unit around the close.
    pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }
}

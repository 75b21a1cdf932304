//! The signal → position → equity → report pipeline for one run.

use crate::domain::equity::accumulate;
use crate::domain::error::BacktestError;
use crate::domain::frequency::BarFrequency;
use crate::domain::metrics::{summarize, PerformanceReport};
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;
use crate::domain::position::resolve;
use crate::domain::strategy::StrategyKind;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

pub const DEFAULT_LEVERAGE: f64 = 1.0;
pub const DEFAULT_COMMISSION_RATE: f64 = 0.0008;
pub const DEFAULT_SLIPPAGE_RATE: f64 = 0.001;

/// Everything that determines a run besides the bars themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub strategy: String,
    pub symbol: String,
    pub parameters: ParameterSet,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub frequency: BarFrequency,
    pub leverage: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl BacktestRequest {
    pub fn new(strategy: &str, symbol: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            symbol: symbol.to_string(),
            parameters: ParameterSet::new(),
            start_date: None,
            end_date: None,
            frequency: BarFrequency::Hour1,
            leverage: DEFAULT_LEVERAGE,
            commission_rate: DEFAULT_COMMISSION_RATE,
            slippage_rate: DEFAULT_SLIPPAGE_RATE,
        }
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_costs(mut self, leverage: f64, commission_rate: f64, slippage_rate: f64) -> Self {
        self.leverage = leverage;
        self.commission_rate = commission_rate;
        self.slippage_rate = slippage_rate;
        self
    }

    pub fn with_range(mut self, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn with_frequency(mut self, frequency: BarFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// True when `bar` falls inside the requested dates (both ends inclusive).
    fn in_range(&self, bar: &Bar) -> bool {
        let date = bar.date();
        self.start_date.is_none_or(|s| date >= s) && self.end_date.is_none_or(|e| date <= e)
    }
}

/// Requested versus actually covered time span of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub requested_start: Option<NaiveDate>,
    pub requested_end: Option<NaiveDate>,
    pub first_bar: Option<NaiveDateTime>,
    pub last_bar: Option<NaiveDateTime>,
    pub bar_count: usize,
}

impl TimeRange {
    fn covering(request: &BacktestRequest, bars: &[Bar]) -> Self {
        Self {
            requested_start: request.start_date,
            requested_end: request.end_date,
            first_bar: bars.first().map(|b| b.timestamp),
            last_bar: bars.last().map(|b| b.timestamp),
            bar_count: bars.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub symbol: String,
    pub parameters: ParameterSet,
    pub leverage: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub time_range: TimeRange,
    pub report: PerformanceReport,
}

/// Run one strategy over one instrument's bars.
///
/// Only an unknown strategy id is an error. Short data, ruin and
/// degenerate ratios come back as diagnostics on the report.
pub fn run_pipeline(request: &BacktestRequest, bars: &[Bar]) -> Result<BacktestResult, BacktestError> {
    let kind: StrategyKind = request.strategy.parse()?;

    let window: Vec<Bar> = bars.iter().filter(|b| request.in_range(b)).cloned().collect();
    let time_range = TimeRange::covering(request, &window);
    tracing::debug!(
        strategy = kind.id(),
        symbol = %request.symbol,
        parameters = %request.parameters,
        bars = window.len(),
        "running pipeline"
    );

    let signals = kind.generate(&window, &request.parameters);
    let positions = resolve(&signals);
    let accumulation = accumulate(
        &window,
        &positions,
        request.leverage,
        request.commission_rate,
        request.slippage_rate,
    );
    let mut report = summarize(
        &window,
        &accumulation.equity_curve,
        &accumulation.net_returns,
        &accumulation.trades,
        &request.frequency,
    );

    let mut diagnostics = signals.diagnostics;
    diagnostics.extend(accumulation.diagnostics);
    diagnostics.append(&mut report.diagnostics);
    report.diagnostics = diagnostics;

    Ok(BacktestResult {
        strategy: kind.id().to_string(),
        symbol: request.symbol.clone(),
        parameters: request.parameters.clone(),
        leverage: request.leverage,
        commission_rate: request.commission_rate,
        slippage_rate: request.slippage_rate,
        time_range,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Diagnostic;
    use chrono::Duration;

    fn daily_bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn request_defaults() {
        let req = BacktestRequest::new("sma", "BTCUSDT");
        assert_eq!(req.frequency, BarFrequency::Hour1);
        assert_eq!(req.leverage, 1.0);
        assert_eq!(req.commission_rate, 0.0008);
        assert_eq!(req.slippage_rate, 0.001);
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        let req = BacktestRequest::new("turtle", "X");
        let err = run_pipeline(&req, &daily_bars(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, BacktestError::UnsupportedStrategy { .. }));
    }

    #[test]
    fn slices_bars_to_requested_dates() {
        let bars = daily_bars(&[10.0; 30]);
        let req = BacktestRequest::new("sma", "X").with_range(
            NaiveDate::from_ymd_opt(2024, 1, 5),
            NaiveDate::from_ymd_opt(2024, 1, 14),
        );
        let result = run_pipeline(&req, &bars).unwrap();

        assert_eq!(result.time_range.bar_count, 10);
        assert_eq!(result.time_range.first_bar, Some(bars[4].timestamp));
        assert_eq!(result.time_range.last_bar, Some(bars[13].timestamp));
        assert_eq!(result.report.bar_count, 10);
    }

    #[test]
    fn short_history_reports_insufficient_data() {
        let req = BacktestRequest::new("sma", "X").with_frequency(BarFrequency::Day1);
        let result = run_pipeline(&req, &daily_bars(&[10.0, 11.0, 12.0])).unwrap();

        assert_eq!(
            result.report.diagnostics[0],
            Diagnostic::InsufficientData {
                bars: 3,
                required: 20
            }
        );
        assert!(result.report.equity_curve.iter().all(|p| p.equity == 1.0));
        assert!(result.report.trades.is_empty());
    }

    #[test]
    fn oversized_window_runs_with_default() {
        let req = BacktestRequest::new("atr_breakout", "X")
            .with_parameters(ParameterSet::new().with("atr_period", 1e300));
        let result = run_pipeline(&req, &daily_bars(&[10.0; 30])).unwrap();
        assert_eq!(result.report.bar_count, 30);
        assert!(result.report.diagnostics.iter().all(|d| !matches!(d, Diagnostic::InsufficientData { .. })));
    }

    #[test]
    fn result_carries_canonical_strategy_id() {
        let req = BacktestRequest::new("MA_Crossover", "X");
        let result = run_pipeline(&req, &daily_bars(&[10.0; 5])).unwrap();
        assert_eq!(result.strategy, "sma");
    }
}

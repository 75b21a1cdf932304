#![allow(dead_code)]

use backtest_pipeline::domain::backtest::BacktestResult;
use backtest_pipeline::domain::error::BacktestError;
pub use backtest_pipeline::domain::ohlcv::Bar;
use backtest_pipeline::domain::sweep::SweepReport;
use backtest_pipeline::ports::data_port::DataPort;
use backtest_pipeline::ports::report_port::ReportPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).ok_or_else(|| BacktestError::Data {
            reason: format!("no data for {symbol}"),
        })?;
        Ok(bars
            .iter()
            .filter(|b| start.is_none_or(|s| b.date() >= s) && end.is_none_or(|e| b.date() <= e))
            .cloned()
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Captures what the pipeline would have written.
#[derive(Default)]
pub struct RecordingReportPort {
    pub singles: RefCell<Vec<(String, PathBuf)>>,
    pub batches: RefCell<Vec<(usize, PathBuf)>>,
    pub sweeps: RefCell<Vec<(usize, PathBuf)>>,
}

impl ReportPort for RecordingReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), BacktestError> {
        self.singles
            .borrow_mut()
            .push((result.symbol.clone(), output_path.to_path_buf()));
        Ok(())
    }

    fn write_batch(&self, results: &[BacktestResult], output_path: &Path) -> Result<(), BacktestError> {
        self.batches
            .borrow_mut()
            .push((results.len(), output_path.to_path_buf()));
        Ok(())
    }

    fn write_sweep(&self, report: &SweepReport, output_path: &Path) -> Result<(), BacktestError> {
        self.sweeps
            .borrow_mut()
            .push((report.runs.len(), output_path.to_path_buf()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn start_time() -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap()
}

/// Hourly bars from closes, opening at the previous close.
pub fn hourly_bars(closes: &[f64]) -> Vec<Bar> {
    spaced_bars(closes, Duration::hours(1))
}

pub fn daily_bars(closes: &[f64]) -> Vec<Bar> {
    spaced_bars(closes, Duration::days(1))
}

fn spaced_bars(closes: &[f64], step: Duration) -> Vec<Bar> {
    let start = start_time();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: start + step * i as i32,
                open,
                high: open.max(close) + 0.5,
                low: (open.min(close) - 0.5).max(0.01),
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// A noisy uptrend long enough for every built-in strategy to warm up.
pub fn trending_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + t * 0.1 + (t * 0.3).sin() * 4.0 + (t * 0.07).cos() * 2.0
        })
        .collect()
}

/// Closes for the moving-average crossover walk-through: a flat base,
/// a breakout, then a collapse.
pub const MA_SCENARIO: [f64; 10] = [10.0, 10.0, 10.0, 10.0, 14.0, 16.0, 16.0, 9.0, 8.0, 8.0];

pub fn write_csv(dir: &Path, symbol: &str, bars: &[Bar]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

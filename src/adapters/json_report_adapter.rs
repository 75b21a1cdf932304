//! JSON report adapter: pretty-printed `serde_json` output.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::sweep::SweepReport;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize `value` to the exact bytes that [`ReportPort`] writes.
    pub fn render<T: Serialize>(value: &T) -> Result<String, BacktestError> {
        serde_json::to_string_pretty(value).map_err(|e| BacktestError::Report {
            reason: format!("failed to serialize report: {}", e),
        })
    }

    fn write_json<T: Serialize>(&self, value: &T, output_path: &Path) -> Result<(), BacktestError> {
        let json = Self::render(value)?;
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, json + "\n").map_err(|e| BacktestError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })?;
        tracing::info!(path = %output_path.display(), "report written");
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), BacktestError> {
        self.write_json(result, output_path)
    }

    fn write_batch(&self, results: &[BacktestResult], output_path: &Path) -> Result<(), BacktestError> {
        self.write_json(&results, output_path)
    }

    fn write_sweep(&self, report: &SweepReport, output_path: &Path) -> Result<(), BacktestError> {
        self.write_json(report, output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_pipeline, BacktestRequest};
    use crate::domain::ohlcv::Bar;
    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    fn sample_result() -> BacktestResult {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars: Vec<Bar> = (0..40)
            .map(|i| {
                let close = 50.0 + (i % 9) as f64;
                Bar {
                    timestamp: start + Duration::hours(i),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10.0,
                }
            })
            .collect();
        run_pipeline(&BacktestRequest::new("rsi", "BTCUSDT"), &bars).unwrap()
    }

    #[test]
    fn writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/report.json");
        JsonReportAdapter::new().write(&sample_result(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["strategy"], "rsi");
        assert_eq!(value["symbol"], "BTCUSDT");
        assert_eq!(value["report"]["frequency"], "1h");
        assert!(value["report"]["equity_curve"].as_array().unwrap().len() == 40);
        assert!(content.contains("\n  \"strategy\""));
    }

    #[test]
    fn writes_batch_as_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batch.json");
        let results = vec![sample_result(), sample_result()];
        JsonReportAdapter::new().write_batch(&results, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn unwritable_path_is_a_report_error() {
        let dir = TempDir::new().unwrap();
        // a directory cannot be overwritten as a file
        let err = JsonReportAdapter::new()
            .write(&sample_result(), dir.path())
            .unwrap_err();
        assert!(matches!(err, BacktestError::Report { .. }));
    }
}

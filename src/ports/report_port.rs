//! Result output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::sweep::SweepReport;
use std::path::Path;

/// Port for persisting pipeline output.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), BacktestError>;

    fn write_batch(&self, results: &[BacktestResult], output_path: &Path) -> Result<(), BacktestError>;

    fn write_sweep(&self, report: &SweepReport, output_path: &Path) -> Result<(), BacktestError>;
}

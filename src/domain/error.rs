//! Domain error and diagnostic types.
//!
//! [`BacktestError`] is fatal and surfaces to the caller. [`Diagnostic`] is
//! the non-fatal side: a run that hits one still produces a well-defined
//! report and carries the diagnostic inside it.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Top-level error type for the backtest pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("unsupported strategy: {name}")]
    UnsupportedStrategy { name: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::Data { .. } => 3,
            BacktestError::UnsupportedStrategy { .. } => 4,
            BacktestError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

/// Non-fatal condition recorded on a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Fewer bars than the strategy's warmup; the signal is all flat.
    InsufficientData { bars: usize, required: usize },
    /// Equity reached zero at `index`; it is held at zero afterwards.
    RuinDetected {
        index: usize,
        timestamp: NaiveDateTime,
    },
    /// A ratio's denominator was zero and the ratio was reported as 0.
    NumericDegeneracy { metric: &'static str },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InsufficientData { bars, required } => {
                write!(f, "insufficient data: have {bars} bars, need more than {required}")
            }
            Diagnostic::RuinDetected { index, timestamp } => {
                write!(f, "ruin detected at bar {index} ({timestamp})")
            }
            Diagnostic::NumericDegeneracy { metric } => {
                write!(f, "{metric} has a zero denominator, reported as 0")
            }
        }
    }
}

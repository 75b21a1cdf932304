//! Configuration validation.
//!
//! Checks the `[backtest]`, `[parameters]` and `[sweep]` sections before
//! anything runs and turns them into a [`BacktestRequest`] and
//! [`ParameterGrid`].

use crate::domain::backtest::{
    BacktestRequest, DEFAULT_COMMISSION_RATE, DEFAULT_LEVERAGE, DEFAULT_SLIPPAGE_RATE,
};
use crate::domain::error::BacktestError;
use crate::domain::frequency::BarFrequency;
use crate::domain::params::ParameterSet;
use crate::domain::strategy::StrategyKind;
use crate::domain::sweep::{Objective, ParameterGrid};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_FREQUENCY: &str = "1h";

const SWEEP_SETTINGS: [&str; 2] = ["objective", "top"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_strategy(config)?;
    validate_symbols(config)?;
    validate_leverage(config)?;
    validate_rate(config, "commission_rate")?;
    validate_rate(config, "slippage_rate")?;
    validate_dates(config)?;
    parameters_from_config(config)?;
    grid_from_config(config)?;
    objective_from_config(config)?;
    Ok(())
}

/// Validate and build the request for the first configured symbol.
pub fn build_request(config: &dyn ConfigPort) -> Result<BacktestRequest, BacktestError> {
    validate_backtest_config(config)?;

    let strategy = required(config, "backtest", "strategy")?;
    let symbols = symbols_from_config(config);
    let symbol = symbols.first().cloned().unwrap_or_default();
    let frequency = BarFrequency::parse(
        &config
            .get_string("backtest", "frequency")
            .unwrap_or_else(|| DEFAULT_FREQUENCY.to_string()),
    );
    if let BarFrequency::Unrecognized(raw) = &frequency {
        tracing::warn!(frequency = %raw, "unrecognized bar frequency, annualizing on a 365-day basis");
    }

    Ok(BacktestRequest::new(&strategy, &symbol)
        .with_parameters(parameters_from_config(config)?)
        .with_range(
            optional_date(config, "start_date")?,
            optional_date(config, "end_date")?,
        )
        .with_frequency(frequency)
        .with_costs(
            config.get_double("backtest", "leverage", DEFAULT_LEVERAGE),
            config.get_double("backtest", "commission_rate", DEFAULT_COMMISSION_RATE),
            config.get_double("backtest", "slippage_rate", DEFAULT_SLIPPAGE_RATE),
        ))
}

/// `[backtest] symbol` as a comma-separated list.
pub fn symbols_from_config(config: &dyn ConfigPort) -> Vec<String> {
    config
        .get_string("backtest", "symbol")
        .map(|s| split_list(&s))
        .unwrap_or_default()
}

/// Every key of `[parameters]` as a number.
pub fn parameters_from_config(config: &dyn ConfigPort) -> Result<ParameterSet, BacktestError> {
    let mut params = ParameterSet::new();
    for key in config.keys("parameters") {
        let raw = config.get_string("parameters", &key).unwrap_or_default();
        params.insert(&key, parse_number("parameters", &key, &raw)?);
    }
    Ok(params)
}

/// Every key of `[sweep]` other than the sweep settings (`objective`,
/// `top`) as a comma-separated list of numbers.
pub fn grid_from_config(config: &dyn ConfigPort) -> Result<ParameterGrid, BacktestError> {
    let mut grid = ParameterGrid::new();
    for key in config.keys("sweep") {
        if SWEEP_SETTINGS.contains(&key.as_str()) {
            continue;
        }
        let raw = config.get_string("sweep", &key).unwrap_or_default();
        let values = split_list(&raw)
            .iter()
            .map(|v| parse_number("sweep", &key, v))
            .collect::<Result<Vec<f64>, _>>()?;
        if values.is_empty() {
            return Err(BacktestError::ConfigInvalid {
                section: "sweep".into(),
                key,
                reason: "expected a comma-separated list of numbers".into(),
            });
        }
        grid.add_axis(&key, values);
    }
    Ok(grid)
}

/// `[sweep] objective`, if set.
pub fn objective_from_config(config: &dyn ConfigPort) -> Result<Option<Objective>, BacktestError> {
    config
        .get_string("sweep", "objective")
        .map(|s| s.parse::<Objective>())
        .transpose()
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let name = required(config, "backtest", "strategy")?;
    name.parse::<StrategyKind>()?;
    Ok(())
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if symbols_from_config(config).is_empty() {
        return Err(BacktestError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        });
    }
    Ok(())
}

fn validate_leverage(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = number_or(config, "leverage", DEFAULT_LEVERAGE)?;
    if value <= 0.0 {
        return Err(BacktestError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "leverage".to_string(),
            reason: "leverage must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_rate(config: &dyn ConfigPort, key: &str) -> Result<(), BacktestError> {
    let value = number_or(config, key, 0.0)?;
    if value < 0.0 {
        return Err(BacktestError::ConfigInvalid {
            section: "backtest".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be non-negative"),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start_date = optional_date(config, "start_date")?;
    let end_date = optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(BacktestError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn optional_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, BacktestError> {
    match config.get_string("backtest", field) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| BacktestError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }),
    }
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, BacktestError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(BacktestError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// A `[backtest]` number that must parse when present.
fn number_or(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, BacktestError> {
    match config.get_string("backtest", key) {
        None => Ok(default),
        Some(raw) => parse_number("backtest", key, &raw),
    }
}

fn parse_number(section: &str, key: &str, raw: &str) -> Result<f64, BacktestError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BacktestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a number", raw.trim()),
        })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

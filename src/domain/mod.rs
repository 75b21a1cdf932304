//! Core domain types and the backtest pipeline.

pub mod ohlcv;
pub mod frequency;
pub mod params;
pub mod indicator;
pub mod strategy;
pub mod position;
pub mod equity;
pub mod metrics;
pub mod backtest;
pub mod sweep;
pub mod config_validation;
pub mod error;

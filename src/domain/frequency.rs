//! Bar frequency and the annualization basis derived from it.
//!
//! Every frequency maps to one periods-per-year constant used for both
//! annualized return and volatility. Anything unrecognized falls back to a
//! 365-day basis.

use serde::{Serialize, Serializer};
use std::fmt;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarFrequency {
    Minute15,
    Minute30,
    Hour1,
    Hour4,
    Day1,
    Week1,
    Unrecognized(String),
}

impl BarFrequency {
    /// Parse a rule string such as `1H`, `4h`, `1D`, `15m`. Never fails.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "15m" | "15min" | "15t" => BarFrequency::Minute15,
            "30m" | "30min" | "30t" => BarFrequency::Minute30,
            "1h" | "h" | "60m" | "hourly" => BarFrequency::Hour1,
            "4h" | "240m" => BarFrequency::Hour4,
            "1d" | "d" | "daily" => BarFrequency::Day1,
            "1w" | "w" | "weekly" => BarFrequency::Week1,
            _ => BarFrequency::Unrecognized(value.to_string()),
        }
    }

    pub fn periods_per_year(&self) -> f64 {
        match self {
            BarFrequency::Minute15 => DAYS_PER_YEAR * 96.0,
            BarFrequency::Minute30 => DAYS_PER_YEAR * 48.0,
            BarFrequency::Hour1 => DAYS_PER_YEAR * 24.0,
            BarFrequency::Hour4 => DAYS_PER_YEAR * 6.0,
            BarFrequency::Day1 => DAYS_PER_YEAR,
            BarFrequency::Week1 => 52.0,
            BarFrequency::Unrecognized(_) => DAYS_PER_YEAR,
        }
    }
}

impl fmt::Display for BarFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarFrequency::Minute15 => write!(f, "15m"),
            BarFrequency::Minute30 => write!(f, "30m"),
            BarFrequency::Hour1 => write!(f, "1h"),
            BarFrequency::Hour4 => write!(f, "4h"),
            BarFrequency::Day1 => write!(f, "1d"),
            BarFrequency::Week1 => write!(f, "1w"),
            BarFrequency::Unrecognized(raw) => write!(f, "{raw}"),
        }
    }
}

/// Serialized as its rule string, e.g. `"4h"`.
impl Serialize for BarFrequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

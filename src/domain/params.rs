//! Flat strategy parameter sets.
//!
//! Parameters are a `name → f64` mapping. Lookups never fail: a missing,
//! non-finite or out-of-range value falls back to the caller's default.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Longest accepted window; anything larger falls back to the default.
pub const MAX_WINDOW: usize = 1_000_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// A window length in `min..=MAX_WINDOW`. Fractional values are rounded.
    pub fn window(&self, name: &str, default: usize, min: usize) -> usize {
        match self.get(name) {
            Some(v) if v.is_finite() && v.round() >= min as f64 && v.round() <= MAX_WINDOW as f64 => {
                v.round() as usize
            }
            Some(v) => {
                tracing::debug!(parameter = name, value = v, default, "window out of range, using default");
                default
            }
            None => default,
        }
    }

    /// A strictly positive multiplier or threshold.
    pub fn positive(&self, name: &str, default: f64) -> f64 {
        match self.get(name) {
            Some(v) if v.is_finite() && v > 0.0 => v,
            Some(v) => {
                tracing::debug!(parameter = name, value = v, default, "value must be positive, using default");
                default
            }
            None => default,
        }
    }

    /// A non-negative value, e.g. a relative gap filter.
    pub fn non_negative(&self, name: &str, default: f64) -> f64 {
        match self.get(name) {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            Some(v) => {
                tracing::debug!(parameter = name, value = v, default, "value must be non-negative, using default");
                default
            }
            None => default,
        }
    }

    /// An oscillator level strictly inside (0, 100).
    pub fn level(&self, name: &str, default: f64) -> f64 {
        match self.get(name) {
            Some(v) if v.is_finite() && v > 0.0 && v < 100.0 => v,
            Some(v) => {
                tracing::debug!(parameter = name, value = v, default, "level outside (0, 100), using default");
                default
            }
            None => default,
        }
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.values.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromIterator<(String, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_uses_value_when_valid() {
        let p = ParameterSet::new().with("period", 14.0);
        assert_eq!(p.window("period", 20, 2), 14);
    }

    #[test]
    fn window_rounds_fractional_values() {
        let p = ParameterSet::new().with("period", 9.6);
        assert_eq!(p.window("period", 20, 1), 10);
    }

    #[test]
    fn window_falls_back_when_missing_or_too_small() {
        let p = ParameterSet::new().with("period", 0.0);
        assert_eq!(p.window("period", 20, 1), 20);
        assert_eq!(p.window("other", 5, 1), 5);
    }

    #[test]
    fn window_rejects_non_finite() {
        let p = ParameterSet::new().with("period", f64::NAN);
        assert_eq!(p.window("period", 20, 1), 20);
    }

    #[test]
    fn window_rejects_values_above_max() {
        let p = ParameterSet::new()
            .with("period", 1e300)
            .with("slow", (MAX_WINDOW + 1) as f64)
            .with("edge", MAX_WINDOW as f64);
        assert_eq!(p.window("period", 14, 1), 14);
        assert_eq!(p.window("slow", 26, 2), 26);
        assert_eq!(p.window("edge", 5, 1), MAX_WINDOW);
    }

    #[test]
    fn positive_and_level_bounds() {
        let p = ParameterSet::new()
            .with("mult", -1.0)
            .with("overbought", 120.0)
            .with("oversold", 25.0);
        assert_eq!(p.positive("mult", 2.0), 2.0);
        assert_eq!(p.level("overbought", 70.0), 70.0);
        assert_eq!(p.level("oversold", 30.0), 25.0);
    }

    #[test]
    fn non_negative_accepts_zero() {
        let p = ParameterSet::new().with("min_gap", 0.0);
        assert_eq!(p.non_negative("min_gap", 0.002), 0.0);
    }

    #[test]
    fn display_is_sorted_by_name() {
        let p = ParameterSet::new().with("long_window", 20.0).with("short_window", 5.0);
        assert_eq!(p.to_string(), "long_window=20,short_window=5");
    }
}

//! Historical bar source port trait.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

/// Supplies cleaned bars for one instrument: time-sorted, one bar per
/// timestamp, no missing OHLC values.
pub trait DataPort {
    /// Bars whose date falls within `start..=end`; an open end is unbounded.
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, BacktestError>;

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError>;
}

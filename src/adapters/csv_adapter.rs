//! CSV file data adapter.
//!
//! Reads `<base>/<symbol>.csv` with a header row and the columns
//! `timestamp,open,high,low,close,volume`. Timestamps are
//! `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD` (midnight). Rows are
//! sorted by time and repeated timestamps keep their first row.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, BacktestError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| BacktestError::Data {
            reason: format!("invalid timestamp '{}': {}", raw, e),
        })
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, BacktestError> {
    let raw = record.get(index).ok_or_else(|| BacktestError::Data {
        reason: format!("missing {} column", name),
    })?;
    let value: f64 = raw.trim().parse().map_err(|e| BacktestError::Data {
        reason: format!("invalid {} value '{}': {}", name, raw, e),
    })?;
    if !value.is_finite() {
        return Err(BacktestError::Data {
            reason: format!("non-finite {} value", name),
        });
    }
    Ok(value)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, BacktestError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| BacktestError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| BacktestError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp = parse_timestamp(record.get(0).ok_or_else(|| BacktestError::Data {
                reason: "missing timestamp column".into(),
            })?)?;

            let date = timestamp.date();
            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        let before = bars.len();
        bars.dedup_by_key(|b| b.timestamp);
        if bars.len() < before {
            tracing::warn!(symbol, dropped = before - bars.len(), "dropped duplicate timestamps");
        }
        let inconsistent = bars.iter().filter(|b| !b.is_consistent()).count();
        if inconsistent > 0 {
            tracing::warn!(symbol, bars = inconsistent, "bars with high/low not bracketing open/close");
        }
        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BacktestError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BacktestError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-15 02:00:00,105.0,115.0,100.0,110.0,600.5\n\
            2024-01-15 01:00:00,100.0,110.0,90.0,105.0,500\n\
            2024-01-16 00:00:00,110.0,120.0,105.0,115.0,550\n\
            2024-01-15 02:00:00,1.0,1.0,1.0,1.0,1\n";

        fs::write(path.join("BTCUSDT.csv"), csv_content).unwrap();
        fs::write(
            path.join("ETHUSDT.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-15,1,2,0.5,1.5,10\n",
        )
        .unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_sorts_and_dedupes() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("BTCUSDT", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(1, 0, 0).unwrap()
        );
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].close, 105.0);
        // the first row for a repeated timestamp wins
        assert_eq!(bars[1].close, 110.0);
        assert_eq!(bars[1].volume, 600.5);
    }

    #[test]
    fn fetch_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16);
        let bars = adapter.fetch_bars("BTCUSDT", day, day).unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date(), NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }

    #[test]
    fn date_only_timestamps_are_midnight() {
        let (_dir, path) = setup_test_data();
        let bars = CsvAdapter::new(path).fetch_bars("ETHUSDT", None, None).unwrap();
        assert_eq!(
            bars[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn fetch_bars_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let result = CsvAdapter::new(path).fetch_bars("XYZ", None, None);
        assert!(matches!(result, Err(BacktestError::Data { .. })));
    }

    #[test]
    fn fetch_bars_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-15,1,2,0.5,oops,10\n",
        )
        .unwrap();
        let result = CsvAdapter::new(dir.path().to_path_buf()).fetch_bars("BAD", None, None);
        assert!(matches!(result, Err(BacktestError::Data { reason }) if reason.contains("close")));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let symbols = CsvAdapter::new(path).list_symbols().unwrap();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }
}

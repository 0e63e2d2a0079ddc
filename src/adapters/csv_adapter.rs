//! CSV file data adapter.
//!
//! One `SYMBOL.csv` per symbol under a base directory, with a
//! `date,open,high,low,close,volume` header. Doubles as the ingest format
//! for the `import` command.

use crate::domain::error::TascanError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbol::SymbolInfo;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    /// Parse every row of one file, in file order.
    pub fn load_file(path: &Path, symbol: &str) -> Result<Vec<OhlcvBar>, TascanError> {
        let mut rdr = csv::Reader::from_path(path).map_err(|e| TascanError::Database {
            reason: format!("failed to open {}: {e}", path.display()),
        })?;

        let mut bars = Vec::new();
        for result in rdr.deserialize() {
            let row: CsvRow = result.map_err(|e| TascanError::Database {
                reason: format!("CSV parse error in {}: {e}", path.display()),
            })?;

            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                TascanError::Database {
                    reason: format!("invalid date '{}' in {}: {e}", row.date, path.display()),
                }
            })?;

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TascanError> {
        let path = self.csv_path(symbol);
        let mut bars = Self::load_file(&path, symbol)?;

        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, TascanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TascanError::Database {
            reason: format!("failed to read directory {}: {e}", self.base_path.display()),
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TascanError::Database {
                reason: format!("directory entry error: {e}"),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                names.push(symbol.to_string());
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .enumerate()
            .map(|(i, symbol)| SymbolInfo {
                id: i as i64 + 1,
                name: symbol.clone(),
                symbol,
                exchange: String::new(),
            })
            .collect())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TascanError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let bars = Self::load_file(&path, symbol)?;
        let min = bars.iter().map(|b| b.date).min();
        let max = bars.iter().map(|b| b.date).max();
        match (min, max) {
            (Some(min), Some(max)) => Ok(Some((min, max, bars.len()))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not a data file").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_ohlcv_returns_rows() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let bars = adapter.fetch_ohlcv("BHP", start, end).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, start);
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].close, 115.0);
    }

    #[test]
    fn fetch_ohlcv_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let bars = adapter.fetch_ohlcv("BHP", day, day).unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day);
    }

    #[test]
    fn missing_file_is_an_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(adapter.fetch_ohlcv("XYZ", start, end).is_err());
    }

    #[test]
    fn list_symbols_ignores_non_csv_files() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols().unwrap();
        let tickers: Vec<&str> = symbols.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(tickers, vec!["BHP", "CBA"]);
    }

    #[test]
    fn data_range() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let (min, max, count) = adapter.get_data_range("BHP").unwrap().unwrap();
        assert_eq!(min, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(max, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
        assert_eq!(count, 3);

        assert!(adapter.get_data_range("XYZ").unwrap().is_none());
        assert!(adapter.get_data_range("CBA").unwrap().is_none());
    }
}

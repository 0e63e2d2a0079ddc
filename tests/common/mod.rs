#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use tascan::domain::error::TascanError;
pub use tascan::domain::ohlcv::OhlcvBar;
use tascan::domain::ohlcv::PriceSeries;
use tascan::domain::symbol::SymbolInfo;
use tascan::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TascanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TascanError::Database {
                reason: reason.clone(),
            });
        }
        let mut bars = self.data.get(symbol).cloned().unwrap_or_default();
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, TascanError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols
            .into_iter()
            .enumerate()
            .map(|(i, symbol)| SymbolInfo {
                id: i as i64 + 1,
                name: format!("{symbol} Ltd"),
                exchange: "ASX".to_string(),
                symbol,
            })
            .collect())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TascanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TascanError::Database {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// One bar per day starting 2024-01-01, closes as given.
pub fn make_close_bars(symbol: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            symbol: symbol.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000,
        })
        .collect()
}

/// Fetch every listed symbol into a scan universe.
pub fn build_universe(port: &dyn DataPort) -> Vec<(SymbolInfo, PriceSeries)> {
    port.list_symbols()
        .unwrap()
        .into_iter()
        .map(|info| {
            let bars = port
                .fetch_ohlcv(&info.symbol, date(1900, 1, 1), date(9999, 12, 31))
                .unwrap();
            let series = PriceSeries::from_bars(&info.symbol, &bars);
            (info, series)
        })
        .collect()
}

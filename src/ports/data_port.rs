//! Data access port trait.

use crate::domain::error::TascanError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbol::SymbolInfo;
use chrono::NaiveDate;

pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TascanError>;

    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, TascanError>;

    /// (first date, last date, bar count) for a stored symbol, if any.
    fn get_data_range(&self, symbol: &str)
        -> Result<Option<(NaiveDate, NaiveDate, usize)>, TascanError>;
}

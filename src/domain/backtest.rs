//! Single-symbol signal backtest.
//!
//! Feeds entry/exit boolean series into a one-position simulation: all-in
//! fractional sizing at the signal bar's close, one open position at a time,
//! re-entry only on a later bar than the exit. A position still open at the
//! end of data is marked to market at the last close. The benchmark is
//! buy-and-hold of the same series.

use crate::domain::error::EvalError;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INITIAL_CASH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub side: Side,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    /// None while the position is still open at the end of data.
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    pub size: f64,
    /// Per-trade return on the entry price; open trades are marked to market.
    pub ret: f64,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub side: Side,
    pub initial_cash: f64,
    pub final_value: f64,
    pub total_profit: f64,
    pub trades: Vec<Trade>,
    /// Portfolio value per bar.
    pub equity: Vec<f64>,
    /// equity / initial_cash - 1, per bar.
    pub cumulative_returns: Vec<f64>,
    /// close / close[0] - 1, per bar.
    pub benchmark_returns: Vec<f64>,
}

struct OpenPosition {
    entry_index: usize,
    entry_price: f64,
    entry_cash: f64,
    size: f64,
}

impl OpenPosition {
    fn value_at(&self, side: Side, price: f64) -> f64 {
        match side {
            Side::Long => self.size * price,
            Side::Short => self.entry_cash + self.size * (self.entry_price - price),
        }
    }

    fn trade_return(&self, side: Side, price: f64) -> f64 {
        match side {
            Side::Long => (price - self.entry_price) / self.entry_price,
            Side::Short => (self.entry_price - price) / self.entry_price,
        }
    }
}

/// Run the simulation. `entries` and `exits` must be aligned to the series.
pub fn run_backtest(
    series: &PriceSeries,
    entries: &[bool],
    exits: &[bool],
    side: Side,
    initial_cash: f64,
) -> Result<BacktestResult, EvalError> {
    if series.is_empty() {
        return Err(EvalError::EmptyHistory {
            symbol: series.symbol.clone(),
        });
    }
    debug_assert_eq!(entries.len(), series.len());
    debug_assert_eq!(exits.len(), series.len());

    let n = series.len();
    let mut trades: Vec<Trade> = Vec::new();
    let mut equity = Vec::with_capacity(n);

    let mut cash = initial_cash;
    let mut position: Option<OpenPosition> = None;

    for i in 0..n {
        let price = series.close[i];
        let mut exited_this_bar = false;

        if let Some(pos) = &position {
            if exits[i] {
                cash = pos.value_at(side, price);
                trades.push(Trade {
                    side,
                    entry_date: series.dates[pos.entry_index],
                    entry_price: pos.entry_price,
                    exit_date: Some(series.dates[i]),
                    exit_price: Some(price),
                    size: pos.size,
                    ret: pos.trade_return(side, price),
                    pnl: cash - pos.entry_cash,
                });
                position = None;
                exited_this_bar = true;
            }
        }

        if position.is_none() && !exited_this_bar && entries[i] && price > 0.0 {
            position = Some(OpenPosition {
                entry_index: i,
                entry_price: price,
                entry_cash: cash,
                size: cash / price,
            });
        }

        let value = match &position {
            Some(pos) => pos.value_at(side, price),
            None => cash,
        };
        equity.push(value);
    }

    // mark any open position to market at the last close
    if let Some(pos) = &position {
        let price = series.close[n - 1];
        trades.push(Trade {
            side,
            entry_date: series.dates[pos.entry_index],
            entry_price: pos.entry_price,
            exit_date: None,
            exit_price: None,
            size: pos.size,
            ret: pos.trade_return(side, price),
            pnl: pos.value_at(side, price) - pos.entry_cash,
        });
    }

    let cumulative_returns: Vec<f64> = equity.iter().map(|v| v / initial_cash - 1.0).collect();
    let first_close = series.close[0];
    let benchmark_returns: Vec<f64> = if first_close > 0.0 {
        series
            .close
            .iter()
            .map(|c| c / first_close - 1.0)
            .collect()
    } else {
        vec![0.0; n]
    };

    let final_value = equity[n - 1];

    Ok(BacktestResult {
        symbol: series.symbol.clone(),
        side,
        initial_cash,
        final_value,
        total_profit: final_value - initial_cash,
        trades,
        equity,
        cumulative_returns,
        benchmark_returns,
    })
}

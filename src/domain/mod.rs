//! Core domain types and logic.

pub mod ohlcv;
pub mod symbol;
pub mod catalog;
pub mod session;
pub mod expr;
pub mod indicator;
pub mod eval;
pub mod scan;
pub mod backtest;
pub mod definition;
pub mod error;

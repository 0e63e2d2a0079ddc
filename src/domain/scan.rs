//! Cross-sectional scan driver.
//!
//! Evaluates a compiled expression per symbol and keeps the boolean at the
//! latest bar. Symbols that cannot be evaluated (no history, too few bars)
//! are recorded and skipped; they never abort the scan. An empty match list
//! is a valid outcome.

use crate::domain::eval;
use crate::domain::expr::Expression;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::session::Session;
use crate::domain::symbol::SymbolInfo;

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanOutcome {
    /// Symbols whose condition held on their latest bar, with metadata.
    pub matches: Vec<SymbolInfo>,
    pub skipped: Vec<SkippedSymbol>,
    /// Total symbols inspected, matches and skips included.
    pub scanned: usize,
}

/// Run the expression over every symbol's materialized history. Truth is
/// taken at each symbol's own latest timestamp.
pub fn scan(
    session: &Session,
    expr: &Expression,
    universe: &[(SymbolInfo, PriceSeries)],
) -> ScanOutcome {
    let mut outcome = ScanOutcome {
        scanned: universe.len(),
        ..Default::default()
    };

    for (info, series) in universe {
        match eval::evaluate(session, expr, series) {
            Ok(result) => {
                if result.last().copied().unwrap_or(false) {
                    outcome.matches.push(info.clone());
                }
            }
            Err(err) => outcome.skipped.push(SkippedSymbol {
                symbol: info.symbol.clone(),
                reason: err.to_string(),
            }),
        }
    }

    outcome
}

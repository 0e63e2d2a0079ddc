//! Symbol metadata as stored in the `symbols` table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}

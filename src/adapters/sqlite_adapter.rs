//! SQLite data adapter.
//!
//! Local analytical store with two tables: `symbols` (metadata, unique
//! ticker) and `prices` (one row per symbol and day, unique on
//! `(stock_id, date)`). Reads come back in ascending date order.

use crate::domain::error::TascanError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbol::SymbolInfo;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TascanError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TascanError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| TascanError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TascanError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TascanError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), TascanError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| TascanError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS symbols (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL DEFAULT '',
                exchange TEXT NOT NULL DEFAULT ''
            );
            CREATE TABLE IF NOT EXISTS prices (
                stock_id INTEGER NOT NULL REFERENCES symbols(id),
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (stock_id, date)
            );
            CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date);",
        )
        .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Insert or update a symbol row, returning its id.
    pub fn upsert_symbol(
        &self,
        symbol: &str,
        name: &str,
        exchange: &str,
    ) -> Result<i64, TascanError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| TascanError::Database {
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO symbols (symbol, name, exchange) VALUES (?1, ?2, ?3)
             ON CONFLICT(symbol) DO UPDATE SET name = ?2, exchange = ?3",
            params![symbol, name, exchange],
        )
        .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        conn.query_row(
            "SELECT id FROM symbols WHERE symbol = ?1",
            params![symbol],
            |row| row.get(0),
        )
        .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
            reason: e.to_string(),
        })
    }

    /// Bulk upsert of price rows for one symbol, in a single transaction.
    /// The symbol row must exist already.
    pub fn insert_bars(&self, symbol: &str, bars: &[OhlcvBar]) -> Result<(), TascanError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| TascanError::Database {
                reason: e.to_string(),
            })?;

        let stock_id: i64 = conn
            .query_row(
                "SELECT id FROM symbols WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: format!("unknown symbol {symbol}: {e}"),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO prices (stock_id, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    stock_id,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TascanError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| TascanError::Database {
                reason: e.to_string(),
            })?;

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let query = "SELECT s.symbol, p.date, p.open, p.high, p.low, p.close, p.volume
                     FROM prices p
                     JOIN symbols s ON s.id = p.stock_id
                     WHERE s.symbol = ?1 AND p.date >= ?2 AND p.date <= ?3
                     ORDER BY p.date ASC";

        let mut stmt = conn
            .prepare(query)
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(OhlcvBar {
                    symbol: row.get(0)?,
                    date,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(
                row.map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, TascanError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| TascanError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT id, symbol, name, exchange FROM symbols ORDER BY symbol";

        let mut stmt = conn
            .prepare(query)
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                Ok(SymbolInfo {
                    id: row.get(0)?,
                    symbol: row.get(1)?,
                    name: row.get(2)?,
                    exchange: row.get(3)?,
                })
            })
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(
                row.map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TascanError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| TascanError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT MIN(p.date), MAX(p.date), COUNT(*)
                     FROM prices p
                     JOIN symbols s ON s.id = p.stock_id
                     WHERE s.symbol = ?1";

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(query, params![symbol], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e: rusqlite::Error| TascanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = NaiveDate::parse_from_str(&min_str, "%Y-%m-%d").map_err(
                    |e: chrono::ParseError| TascanError::Database {
                        reason: e.to_string(),
                    },
                )?;
                let max = NaiveDate::parse_from_str(&max_str, "%Y-%m-%d").map_err(
                    |e: chrono::ParseError| TascanError::Database {
                        reason: e.to_string(),
                    },
                )?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

//! Integration tests.
//!
//! Tests cover:
//! - Full scan pipeline with mock data port (no database)
//! - Metadata join on matches and skip-and-continue on thin history
//! - Full backtest pipeline: definition file through signals to trades
//! - Full pipeline via SqliteAdapter with a seeded in-memory database
//! - CSV ingest into sqlite, mirroring the `import` command

mod common;

use common::*;
use tascan::domain::backtest::{run_backtest, Side, DEFAULT_INITIAL_CASH};
use tascan::domain::definition::{BacktestDefinition, ScanDefinition};
use tascan::domain::eval;
use tascan::domain::ohlcv::PriceSeries;
use tascan::domain::scan::scan;
use tascan::ports::data_port::DataPort;

/// Fast MA overtaking the slow one on the latest bar.
const CROSS_SCAN_JSON: &str = r#"{
    "indicators": [
        { "type": "MA", "params": { "window": 2, "short_name": "ma_fast" } },
        { "type": "MA", "params": { "window": 4, "short_name": "ma_slow" } }
    ],
    "conditions": [
        {
            "left": "ma_fast",
            "operator": "ma_crossed_above",
            "rhs": { "indicator": "ma_slow" }
        }
    ]
}"#;

const THRESHOLD_BACKTEST_JSON: &str = r#"{
    "indicators": [
        { "type": "MA", "params": { "window": 1, "short_name": "px" } }
    ],
    "entries": [
        { "left": "px", "operator": "ma_above", "rhs": { "value": 100.0 } }
    ],
    "exits": [
        { "left": "px", "operator": "ma_below", "rhs": { "value": 100.0 } }
    ]
}"#;

mod scan_pipeline {
    use super::*;

    #[test]
    fn full_scan_pipeline_with_mock_data_port() {
        let port = MockDataPort::new()
            // MA(2) crosses above MA(4) exactly on the last bar
            .with_bars("CROSS", make_close_bars("CROSS", &[10.0, 8.0, 6.0, 4.0, 6.0, 8.0]))
            // steadily falling, the fast mean stays below the slow one
            .with_bars("DOWN", make_close_bars("DOWN", &[20.0, 19.0, 18.0, 17.0, 16.0, 15.0]))
            // too little history for MA(4)
            .with_bars("FEW", make_close_bars("FEW", &[10.0, 12.0]));

        let def = ScanDefinition::from_json_str(CROSS_SCAN_JSON).unwrap();
        let (session, expr) = def.build().unwrap();

        let universe = build_universe(&port);
        let outcome = scan(&session, &expr, &universe);

        assert_eq!(outcome.scanned, 3);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].symbol, "CROSS");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].symbol, "FEW");
    }

    #[test]
    fn matches_carry_symbol_metadata() {
        let port = MockDataPort::new()
            .with_bars("CROSS", make_close_bars("CROSS", &[10.0, 8.0, 6.0, 4.0, 6.0, 8.0]));

        let def = ScanDefinition::from_json_str(CROSS_SCAN_JSON).unwrap();
        let (session, expr) = def.build().unwrap();

        let outcome = scan(&session, &expr, &build_universe(&port));
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].name, "CROSS Ltd");
        assert_eq!(outcome.matches[0].exchange, "ASX");
    }

    #[test]
    fn cross_earlier_in_history_does_not_match() {
        // same shape as CROSS plus two extra bars, so the cross bar is no
        // longer the latest one
        let port = MockDataPort::new().with_bars(
            "LATE",
            make_close_bars("LATE", &[10.0, 8.0, 6.0, 4.0, 6.0, 8.0, 10.0, 12.0]),
        );

        let def = ScanDefinition::from_json_str(CROSS_SCAN_JSON).unwrap();
        let (session, expr) = def.build().unwrap();

        let outcome = scan(&session, &expr, &build_universe(&port));
        assert!(outcome.matches.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn fetch_error_surfaces_from_the_port() {
        let port = MockDataPort::new().with_error("BAD", "connection refused");

        let err = port
            .fetch_ohlcv("BAD", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}

mod backtest_pipeline {
    use super::*;

    fn run_threshold_backtest(closes: &[f64]) -> tascan::domain::backtest::BacktestResult {
        let def = BacktestDefinition::from_json_str(THRESHOLD_BACKTEST_JSON).unwrap();
        let (session, entries, exits) = def.build().unwrap();

        let port = MockDataPort::new().with_bars("BHP", make_close_bars("BHP", closes));
        let bars = port
            .fetch_ohlcv("BHP", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
        let series = PriceSeries::from_bars("BHP", &bars);

        let entry_signals = eval::evaluate(&session, &entries, &series).unwrap();
        let exit_signals = eval::evaluate(&session, &exits, &series).unwrap();

        run_backtest(
            &series,
            &entry_signals,
            &exit_signals,
            def.side,
            DEFAULT_INITIAL_CASH,
        )
        .unwrap()
    }

    #[test]
    fn full_backtest_pipeline_with_known_trade() {
        let result = run_threshold_backtest(&[90.0, 110.0, 105.0, 95.0, 90.0]);

        assert_eq!(result.side, Side::Long);
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.entry_date, date(2024, 1, 2));
        assert_eq!(trade.exit_date, Some(date(2024, 1, 4)));
        assert!((trade.entry_price - 110.0).abs() < 1e-9);
        assert_eq!(trade.exit_price, Some(95.0));

        // 100 -> buy at 110 -> sell at 95
        let expected_final = 100.0 / 110.0 * 95.0;
        assert!((result.final_value - expected_final).abs() < 1e-9);
        assert!((result.total_profit - (expected_final - 100.0)).abs() < 1e-9);
    }

    #[test]
    fn cumulative_and_benchmark_returns_align_with_equity() {
        let result = run_threshold_backtest(&[90.0, 110.0, 105.0, 95.0, 90.0]);

        assert_eq!(result.equity.len(), 5);
        assert_eq!(result.cumulative_returns.len(), 5);
        assert_eq!(result.benchmark_returns.len(), 5);

        let last_cum = *result.cumulative_returns.last().unwrap();
        assert!((last_cum - (result.final_value / 100.0 - 1.0)).abs() < 1e-9);

        // close ends where it started, so buy-and-hold is flat
        let last_bench = *result.benchmark_returns.last().unwrap();
        assert!(last_bench.abs() < 1e-9);
    }

    #[test]
    fn position_open_at_end_is_marked_to_market() {
        let result = run_threshold_backtest(&[90.0, 110.0, 120.0]);

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_date, None);
        assert_eq!(trade.exit_price, None);
        assert!((trade.ret - (120.0 - 110.0) / 110.0).abs() < 1e-9);

        let expected_final = 100.0 / 110.0 * 120.0;
        assert!((result.final_value - expected_final).abs() < 1e-9);
    }

    #[test]
    fn no_signals_produce_no_trades() {
        let result = run_threshold_backtest(&[90.0, 95.0, 92.0]);

        assert!(result.trades.is_empty());
        assert!((result.final_value - 100.0).abs() < 1e-9);
        assert!(result.cumulative_returns.iter().all(|r| r.abs() < 1e-9));
    }

    #[test]
    fn short_side_profits_from_falling_prices() {
        let def = BacktestDefinition::from_json_str(
            r#"{
                "indicators": [
                    { "type": "MA", "params": { "window": 1, "short_name": "px" } }
                ],
                "side": "short",
                "entries": [
                    { "left": "px", "operator": "ma_below", "rhs": { "value": 100.0 } }
                ],
                "exits": [
                    { "left": "px", "operator": "ma_above", "rhs": { "value": 100.0 } }
                ]
            }"#,
        )
        .unwrap();
        let (session, entries, exits) = def.build().unwrap();

        let series = PriceSeries::from_bars("BHP", &make_close_bars("BHP", &[110.0, 90.0, 80.0, 105.0]));
        let entry_signals = eval::evaluate(&session, &entries, &series).unwrap();
        let exit_signals = eval::evaluate(&session, &exits, &series).unwrap();

        let result = run_backtest(&series, &entry_signals, &exit_signals, def.side, 100.0).unwrap();

        assert_eq!(result.side, Side::Short);
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert!((trade.entry_price - 90.0).abs() < 1e-9);
        assert_eq!(trade.exit_price, Some(105.0));
        // short entered at 90, covered at 105
        assert!(trade.pnl < 0.0);
        assert!((trade.ret - (90.0 - 105.0) / 90.0).abs() < 1e-9);
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_pipeline {
    use super::*;
    use std::collections::HashMap;
    use tascan::adapters::csv_adapter::CsvAdapter;
    use tascan::adapters::sqlite_adapter::SqliteAdapter;

    fn seed_sqlite_adapter(bars: &[OhlcvBar]) -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();

        let mut by_symbol: HashMap<String, Vec<OhlcvBar>> = HashMap::new();
        for bar in bars {
            by_symbol.entry(bar.symbol.clone()).or_default().push(bar.clone());
        }
        for (symbol, bars) in &by_symbol {
            adapter
                .upsert_symbol(symbol, &format!("{symbol} Ltd"), "ASX")
                .unwrap();
            adapter.insert_bars(symbol, bars).unwrap();
        }
        adapter
    }

    #[test]
    fn full_scan_pipeline_via_sqlite_adapter() {
        let mut bars = make_close_bars("CROSS", &[10.0, 8.0, 6.0, 4.0, 6.0, 8.0]);
        bars.extend(make_close_bars("DOWN", &[20.0, 19.0, 18.0, 17.0, 16.0, 15.0]));
        let adapter = seed_sqlite_adapter(&bars);

        let def = ScanDefinition::from_json_str(CROSS_SCAN_JSON).unwrap();
        let (session, expr) = def.build().unwrap();

        let outcome = scan(&session, &expr, &build_universe(&adapter));
        assert_eq!(outcome.scanned, 2);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].symbol, "CROSS");
        assert_eq!(outcome.matches[0].name, "CROSS Ltd");
        assert_eq!(outcome.matches[0].exchange, "ASX");
    }

    #[test]
    fn sqlite_list_symbols_and_data_range() {
        let mut bars = make_close_bars("BHP", &[100.0, 101.0, 102.0]);
        bars.extend(make_close_bars("CBA", &[50.0, 51.0]));
        let adapter = seed_sqlite_adapter(&bars);

        let symbols = adapter.list_symbols().unwrap();
        let tickers: Vec<&str> = symbols.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(tickers, vec!["BHP", "CBA"]);

        let (min, max, count) = adapter.get_data_range("BHP").unwrap().unwrap();
        assert_eq!(min, date(2024, 1, 1));
        assert_eq!(max, date(2024, 1, 3));
        assert_eq!(count, 3);
        assert!(adapter.get_data_range("RIO").unwrap().is_none());
    }

    #[test]
    fn sqlite_fetch_respects_date_range() {
        let bars = make_close_bars("BHP", &[100.0, 101.0, 102.0, 103.0, 104.0]);
        let adapter = seed_sqlite_adapter(&bars);

        let fetched = adapter
            .fetch_ohlcv("BHP", date(2024, 1, 2), date(2024, 1, 4))
            .unwrap();
        assert_eq!(fetched.len(), 3);
        assert_eq!(fetched[0].date, date(2024, 1, 2));
        assert_eq!(fetched[2].date, date(2024, 1, 4));
    }

    #[test]
    fn csv_ingest_round_trips_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("BHP.csv");
        std::fs::write(
            &csv_path,
            "date,open,high,low,close,volume\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000\n",
        )
        .unwrap();

        let bars = CsvAdapter::load_file(&csv_path, "BHP").unwrap();
        assert_eq!(bars.len(), 2);

        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter.upsert_symbol("BHP", "BHP Ltd", "ASX").unwrap();
        adapter.insert_bars("BHP", &bars).unwrap();

        let fetched = adapter
            .fetch_ohlcv("BHP", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].close, 105.0);
        assert_eq!(fetched[1].volume, 60000);
    }
}

//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self, DEFAULT_INITIAL_CASH};
use crate::domain::catalog;
use crate::domain::definition::{BacktestDefinition, ScanDefinition};
use crate::domain::error::TascanError;
use crate::domain::eval;
use crate::domain::expr::Expression;
use crate::domain::indicator;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::scan;
use crate::domain::session::Session;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "tascan", about = "Technical-analysis scanner and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan every stored symbol against a condition definition
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        definition: PathBuf,
        /// Only use bars on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Only use bars on or before this date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
    /// Backtest entry/exit conditions against one symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        definition: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        cash: Option<f64>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Import per-symbol CSV files into the database
    Import {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of SYMBOL.csv files
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        exchange: Option<String>,
    },
    /// List stored symbols
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for a stored symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
    },
    /// Validate a definition file without touching the database
    Validate {
        #[arg(short, long)]
        definition: PathBuf,
        /// Treat the file as a backtest definition (entries/exits)
        #[arg(long)]
        backtest: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    if let Err(e) = catalog::verify_catalog() {
        let err = TascanError::from(e);
        eprintln!("error: {err}");
        return ExitCode::from(&err);
    }

    match cli.command {
        Command::Scan {
            config,
            definition,
            start,
            end,
        } => run_scan(&config, &definition, start.as_deref(), end.as_deref()),
        Command::Backtest {
            config,
            definition,
            symbol,
            cash,
            start,
            end,
        } => run_backtest(
            &config,
            &definition,
            &symbol,
            cash,
            start.as_deref(),
            end.as_deref(),
        ),
        Command::Import {
            config,
            dir,
            exchange,
        } => run_import(&config, &dir, exchange.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, symbol } => run_info(&config, &symbol),
        Command::Validate {
            definition,
            backtest,
        } => run_validate(&definition, backtest),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TascanError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn report(err: &TascanError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Start/end of the fetch window. CLI flags win over the config's `[scan]`
/// section; with neither set, the window covers all stored history. The
/// sentinels stay four-digit because stored dates compare as text.
fn resolve_window(
    start_flag: Option<&str>,
    end_flag: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<(NaiveDate, NaiveDate), TascanError> {
    let parse = |value: &str, key: &str| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| TascanError::ConfigInvalid {
            section: "scan".into(),
            key: key.into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        })
    };

    let start = match start_flag
        .map(str::to_string)
        .or_else(|| config.get_string("scan", "start_date"))
    {
        Some(s) => parse(&s, "start_date")?,
        None => NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default(),
    };
    let end = match end_flag
        .map(str::to_string)
        .or_else(|| config.get_string("scan", "end_date"))
    {
        Some(s) => parse(&s, "end_date")?,
        None => NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or_default(),
    };

    Ok((start, end))
}

#[cfg(feature = "sqlite")]
fn open_data_port(config: &dyn ConfigPort) -> Result<crate::adapters::sqlite_adapter::SqliteAdapter, ExitCode> {
    crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config).map_err(|e| report(&e))
}

fn run_scan(
    config_path: &PathBuf,
    definition_path: &PathBuf,
    start: Option<&str>,
    end: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("Loading definition from {}", definition_path.display());
    let def = match ScanDefinition::from_json_file(definition_path) {
        Ok(d) => d,
        Err(e) => return report(&e),
    };
    let (session, expr) = match def.build() {
        Ok(built) => built,
        Err(e) => return report(&TascanError::from(e)),
    };

    let (start_date, end_date) = match resolve_window(start, end, &config) {
        Ok(w) => w,
        Err(e) => return report(&e),
    };

    #[cfg(feature = "sqlite")]
    {
        let data_port = match open_data_port(&config) {
            Ok(a) => a,
            Err(code) => return code,
        };
        run_scan_pipeline(&data_port, &session, &expr, start_date, end_date)
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, session, expr, start_date, end_date);
        eprintln!("error: sqlite feature is required for scan");
        ExitCode::from(1)
    }
}

pub fn run_scan_pipeline(
    data_port: &dyn DataPort,
    session: &Session,
    expr: &Expression,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> ExitCode {
    let symbols = match data_port.list_symbols() {
        Ok(s) => s,
        Err(e) => return report(&e),
    };
    if symbols.is_empty() {
        eprintln!("error: no symbols in database");
        return ExitCode::from(5);
    }
    eprintln!("Scanning {} symbols...", symbols.len());

    let mut universe = Vec::with_capacity(symbols.len());
    for info in symbols {
        match data_port.fetch_ohlcv(&info.symbol, start_date, end_date) {
            Ok(bars) => {
                let series = PriceSeries::from_bars(&info.symbol, &bars);
                universe.push((info, series));
            }
            Err(e) => eprintln!("warning: skipping {} ({e})", info.symbol),
        }
    }

    let outcome = scan::scan(session, expr, &universe);

    for skipped in &outcome.skipped {
        eprintln!("warning: skipping {} ({})", skipped.symbol, skipped.reason);
    }
    for info in &outcome.matches {
        println!("{}\t{}\t{}", info.symbol, info.name, info.exchange);
    }
    eprintln!(
        "{} of {} symbols matched ({} skipped)",
        outcome.matches.len(),
        outcome.scanned,
        outcome.skipped.len(),
    );
    ExitCode::SUCCESS
}

fn run_backtest(
    config_path: &PathBuf,
    definition_path: &PathBuf,
    symbol: &str,
    cash: Option<f64>,
    start: Option<&str>,
    end: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("Loading definition from {}", definition_path.display());
    let def = match BacktestDefinition::from_json_file(definition_path) {
        Ok(d) => d,
        Err(e) => return report(&e),
    };
    let (session, entries, exits) = match def.build() {
        Ok(built) => built,
        Err(e) => return report(&TascanError::from(e)),
    };

    let (start_date, end_date) = match resolve_window(start, end, &config) {
        Ok(w) => w,
        Err(e) => return report(&e),
    };

    let initial_cash =
        cash.unwrap_or_else(|| config.get_double("backtest", "initial_cash", DEFAULT_INITIAL_CASH));
    if initial_cash <= 0.0 {
        eprintln!("error: initial cash must be positive");
        return ExitCode::from(2);
    }

    #[cfg(feature = "sqlite")]
    {
        let data_port = match open_data_port(&config) {
            Ok(a) => a,
            Err(code) => return code,
        };
        run_backtest_pipeline(
            &data_port,
            &session,
            &entries,
            &exits,
            def.side,
            symbol,
            initial_cash,
            start_date,
            end_date,
        )
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, session, entries, exits, initial_cash, start_date, end_date, symbol);
        eprintln!("error: sqlite feature is required for backtest");
        ExitCode::from(1)
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    session: &Session,
    entries: &Expression,
    exits: &Expression,
    side: backtest::Side,
    symbol: &str,
    initial_cash: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> ExitCode {
    let bars = match data_port.fetch_ohlcv(symbol, start_date, end_date) {
        Ok(bars) => bars,
        Err(e) => return report(&e),
    };
    let series = PriceSeries::from_bars(symbol, &bars);

    let entry_signals = match eval::evaluate(session, entries, &series) {
        Ok(s) => s,
        Err(e) => return report(&TascanError::from(e)),
    };
    let exit_signals = match eval::evaluate(session, exits, &series) {
        Ok(s) => s,
        Err(e) => return report(&TascanError::from(e)),
    };

    let result = match backtest::run_backtest(&series, &entry_signals, &exit_signals, side, initial_cash)
    {
        Ok(r) => r,
        Err(e) => return report(&TascanError::from(e)),
    };

    let side_label = match result.side {
        backtest::Side::Long => "long",
        backtest::Side::Short => "short",
    };
    eprintln!(
        "\n=== Backtest: {} ({side_label}, {} bars) ===",
        result.symbol,
        series.len(),
    );
    eprintln!("Initial cash:  {:.2}", result.initial_cash);
    eprintln!("Final value:   {:.2}", result.final_value);
    eprintln!("Total profit:  {:.2}", result.total_profit);
    if let Some(last) = result.cumulative_returns.last() {
        eprintln!("Return:        {:.2}%", last * 100.0);
    }
    if let Some(last) = result.benchmark_returns.last() {
        eprintln!("Buy-and-hold:  {:.2}%", last * 100.0);
    }
    eprintln!("Trades:        {}", result.trades.len());

    for trade in &result.trades {
        match (trade.exit_date, trade.exit_price) {
            (Some(exit_date), Some(exit_price)) => println!(
                "{}\t{:.4}\t{}\t{:.4}\t{:+.2}%\t{:+.2}",
                trade.entry_date,
                trade.entry_price,
                exit_date,
                exit_price,
                trade.ret * 100.0,
                trade.pnl,
            ),
            _ => println!(
                "{}\t{:.4}\topen\t-\t{:+.2}%\t{:+.2}",
                trade.entry_date,
                trade.entry_price,
                trade.ret * 100.0,
                trade.pnl,
            ),
        }
    }
    ExitCode::SUCCESS
}

fn run_import(config_path: &PathBuf, dir: &PathBuf, exchange: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::csv_adapter::CsvAdapter;

        let adapter = match open_data_port(&config) {
            Ok(a) => a,
            Err(code) => return code,
        };
        if let Err(e) = adapter.initialize_schema() {
            return report(&e);
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("error: failed to read directory {}: {e}", dir.display());
                return ExitCode::from(1);
            }
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        files.sort();

        if files.is_empty() {
            eprintln!("error: no CSV files found in {}", dir.display());
            return ExitCode::from(1);
        }

        let exchange = exchange
            .map(str::to_string)
            .or_else(|| config.get_string("import", "exchange"))
            .unwrap_or_default();

        let mut imported = 0usize;
        let mut total_bars = 0usize;
        for path in &files {
            let symbol = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s.to_string(),
                None => continue,
            };

            let bars = match CsvAdapter::load_file(path, &symbol) {
                Ok(bars) => bars,
                Err(e) => {
                    eprintln!("warning: skipping {} ({e})", path.display());
                    continue;
                }
            };

            if let Err(e) = adapter.upsert_symbol(&symbol, &symbol, &exchange) {
                eprintln!("warning: skipping {symbol} ({e})");
                continue;
            }
            if let Err(e) = adapter.insert_bars(&symbol, &bars) {
                eprintln!("warning: skipping {symbol} ({e})");
                continue;
            }

            eprintln!("  {symbol}: {} bars", bars.len());
            imported += 1;
            total_bars += bars.len();
        }

        eprintln!(
            "Imported {imported} of {} symbols ({total_bars} bars)",
            files.len(),
        );
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, dir, exchange);
        eprintln!("error: sqlite feature is required for import");
        ExitCode::from(1)
    }
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        let adapter = match open_data_port(&config) {
            Ok(a) => a,
            Err(code) => return code,
        };

        let symbols = match adapter.list_symbols() {
            Ok(s) => s,
            Err(e) => return report(&e),
        };

        if symbols.is_empty() {
            eprintln!("No symbols found");
        } else {
            for info in &symbols {
                println!("{}\t{}\t{}", info.symbol, info.name, info.exchange);
            }
            eprintln!("{} symbols found", symbols.len());
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        eprintln!("error: sqlite feature is required for list-symbols");
        ExitCode::from(1)
    }
}

fn run_info(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        let adapter = match open_data_port(&config) {
            Ok(a) => a,
            Err(code) => return code,
        };

        match adapter.get_data_range(symbol) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{symbol}: {count} bars, {min_date} to {max_date}");
                ExitCode::SUCCESS
            }
            Ok(None) => {
                eprintln!("{symbol}: no data found");
                ExitCode::from(5)
            }
            Err(e) => report(&e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, symbol);
        eprintln!("error: sqlite feature is required for info");
        ExitCode::from(1)
    }
}

fn print_session(session: &Session) {
    eprintln!("\nIndicators:");
    for inst in session.instances() {
        eprintln!(
            "  {} ({}, warmup {} bars)",
            inst.short_name,
            inst.kind,
            indicator::min_bars(inst),
        );
    }
}

fn run_validate(definition_path: &PathBuf, as_backtest: bool) -> ExitCode {
    eprintln!("Validating definition: {}", definition_path.display());

    if as_backtest {
        let def = match BacktestDefinition::from_json_file(definition_path) {
            Ok(d) => d,
            Err(e) => return report(&e),
        };
        let (session, entries, exits) = match def.build() {
            Ok(built) => built,
            Err(e) => return report(&TascanError::from(e)),
        };

        print_session(&session);
        eprintln!(
            "\n{} entry clause(s), {} exit clause(s)",
            entries.clauses().len(),
            exits.clauses().len(),
        );
    } else {
        let def = match ScanDefinition::from_json_file(definition_path) {
            Ok(d) => d,
            Err(e) => return report(&e),
        };
        let (session, expr) = match def.build() {
            Ok(built) => built,
            Err(e) => return report(&TascanError::from(e)),
        };

        print_session(&session);
        eprintln!("\n{} condition clause(s)", expr.clauses().len());
    }

    eprintln!("\nDefinition is valid.");
    ExitCode::SUCCESS
}

//! CLI definition and dispatch.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::config_validation::{
    validate_backtest_dates, validate_engine_config, validate_paper_config,
    validate_strategy_config,
};
use crate::domain::engine::{run_backtest, EngineConfig};
use crate::domain::error::SigtraderError;
use crate::domain::execution::{ExecutionConfig, SizingPolicy};
use crate::domain::paper::PaperSession;
use crate::domain::report::Report;
use crate::domain::strategy::StrategyRegistry;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Signal-driven trading backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a historical date range
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pair: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Paper-trade against incrementally arriving bars
    Paper {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many bars have been processed
        #[arg(long)]
        max_bars: Option<usize>,
    },
    /// List pairs available in the data directory
    ListPairs {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for a pair
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        pair: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            pair,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest_command(&config, output.as_deref(), pair.as_deref())
            }
        }
        Command::Paper { config, max_bars } => run_paper(&config, max_bars),
        Command::ListPairs { config } => run_list_pairs(&config),
        Command::Info { config, pair } => run_info(&config, pair.as_deref()),
    }
}

pub fn load_config(path: &std::path::Path) -> Result<FileConfigAdapter, SigtraderError> {
    FileConfigAdapter::from_file(path)
}

/// Build the engine configuration from a validated config.
pub fn build_engine_config(config: &dyn ConfigPort) -> EngineConfig {
    let policy = config
        .get_string("engine", "sizing_policy")
        .unwrap_or_else(|| "fixed_fraction".to_string());
    let value = config.get_double("engine", "sizing_value", 1.0);
    let sizing = match policy.as_str() {
        "fixed_quantity" => SizingPolicy::FixedQuantity(value),
        _ => SizingPolicy::FixedFraction(value),
    };

    EngineConfig {
        initial_cash: config.get_double("engine", "initial_cash", 0.0),
        execution: ExecutionConfig {
            fee_rate: config.get_double("engine", "fee_rate", 0.0),
            slippage_rate: config.get_double("engine", "slippage_rate", 0.0),
            min_trade_unit: config.get_double("engine", "min_trade_unit", 0.0001),
            sizing,
        },
        close_at_end: config.get_bool("engine", "close_at_end", true),
    }
}

/// The backtest window: start date at midnight through the end of the end
/// date, both UTC.
pub fn backtest_range(
    config: &dyn ConfigPort,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SigtraderError> {
    let start = parse_config_date(config, "start_date")?;
    let end = parse_config_date(config, "end_date")?;
    let start = start.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = end.and_hms_opt(23, 59, 59).unwrap().and_utc();
    Ok((start, end))
}

fn parse_config_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, SigtraderError> {
    let value =
        config
            .get_string("engine", key)
            .ok_or_else(|| SigtraderError::ConfigMissing {
                section: "engine".to_string(),
                key: key.to_string(),
            })?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| SigtraderError::ConfigInvalid {
        section: "engine".to_string(),
        key: key.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

fn data_adapter(config: &dyn ConfigPort) -> CsvAdapter {
    let dir = config
        .get_string("data", "csv_dir")
        .unwrap_or_else(|| "./data".to_string());
    CsvAdapter::new(PathBuf::from(dir))
}

fn resolve_pair(config: &dyn ConfigPort, override_pair: Option<&str>) -> String {
    match override_pair {
        Some(pair) => pair.to_string(),
        None => config.get_string("engine", "pair").unwrap_or_default(),
    }
}

fn fail(err: &SigtraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn run_dry_run(config_path: &std::path::Path) -> ExitCode {
    match try_dry_run(config_path) {
        Ok(strategy_name) => {
            println!("Configuration OK (strategy: {strategy_name})");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn try_dry_run(config_path: &std::path::Path) -> Result<String, SigtraderError> {
    let config = load_config(config_path)?;
    validate_engine_config(&config)?;
    validate_backtest_dates(&config)?;
    validate_strategy_config(&config)?;

    let name = config.get_string("strategy", "name").unwrap_or_default();
    let registry = StrategyRegistry::with_builtins();
    let strategy = registry.build(&name, &config)?;
    Ok(strategy.name().to_string())
}

fn run_backtest_command(
    config_path: &std::path::Path,
    output: Option<&std::path::Path>,
    pair_override: Option<&str>,
) -> ExitCode {
    match try_backtest(config_path, output, pair_override) {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn try_backtest(
    config_path: &std::path::Path,
    output: Option<&std::path::Path>,
    pair_override: Option<&str>,
) -> Result<Report, SigtraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_engine_config(&config)?;
    validate_backtest_dates(&config)?;
    validate_strategy_config(&config)?;

    let name = config.get_string("strategy", "name").unwrap_or_default();
    let registry = StrategyRegistry::with_builtins();
    let strategy = registry.build(&name, &config)?;

    let pair = resolve_pair(&config, pair_override);
    let (start, end) = backtest_range(&config)?;
    let data = data_adapter(&config);

    eprintln!("Fetching {pair} bars from {start} to {end}");
    let bars = data.fetch_bars(&pair, start, end)?;
    if bars.is_empty() {
        return Err(SigtraderError::NoData { pair });
    }
    eprintln!("Running {} over {} bars", strategy.name(), bars.len());

    let report = run_backtest(&bars, strategy.as_ref(), build_engine_config(&config))?;

    if let Some(output_path) = output {
        TextReportAdapter::new().write(&report, output_path)?;
        eprintln!("Report written to {}", output_path.display());
    }
    Ok(report)
}

fn run_paper(config_path: &std::path::Path, max_bars: Option<usize>) -> ExitCode {
    match try_paper(config_path, max_bars) {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn try_paper(
    config_path: &std::path::Path,
    max_bars: Option<usize>,
) -> Result<Report, SigtraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_engine_config(&config)?;
    validate_paper_config(&config)?;
    validate_strategy_config(&config)?;

    let name = config.get_string("strategy", "name").unwrap_or_default();
    let registry = StrategyRegistry::with_builtins();
    let strategy = registry.build(&name, &config)?;

    let pair = resolve_pair(&config, None);
    let interval = config.get_int("engine", "interval_minutes", 15);
    let data = data_adapter(&config);
    let engine_config = build_engine_config(&config);

    eprintln!(
        "Starting paper trading for {pair} at {interval}-min interval with {:.2}",
        engine_config.initial_cash
    );

    let mut session = PaperSession::new(&data, strategy.as_ref(), &pair, engine_config);
    loop {
        let seen_before = session.bars_seen();
        let fills = session.poll()?;
        for fill in &fills {
            println!(
                "{} {} @ {:.2} x {}",
                fill.timestamp,
                fill.side.to_string().to_uppercase(),
                fill.price,
                fill.quantity
            );
        }
        match max_bars {
            // Bounded runs replay as fast as the data arrives and stop at
            // the limit or when the feed dries up.
            Some(limit) => {
                if session.bars_seen() >= limit || session.bars_seen() == seen_before {
                    break;
                }
            }
            // Unbounded runs wait out the bar interval between polls.
            None => std::thread::sleep(Duration::from_secs(interval as u64 * 60)),
        }
    }
    session.finish()
}

fn run_list_pairs(config_path: &std::path::Path) -> ExitCode {
    let result = load_config(config_path).and_then(|config| data_adapter(&config).list_pairs());
    match result {
        Ok(pairs) => {
            for pair in pairs {
                println!("{pair}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_info(config_path: &std::path::Path, pair_override: Option<&str>) -> ExitCode {
    let result = load_config(config_path).and_then(|config| {
        let data = data_adapter(&config);
        let pair = resolve_pair(&config, pair_override);
        if pair.is_empty() {
            return Err(SigtraderError::ConfigMissing {
                section: "engine".to_string(),
                key: "pair".to_string(),
            });
        }
        let range = data.data_range(&pair)?;
        Ok((pair, range))
    });
    match result {
        Ok((pair, Some((first, last, count)))) => {
            println!("{pair}: {count} bars from {first} to {last}");
            ExitCode::SUCCESS
        }
        Ok((pair, None)) => {
            println!("{pair}: no data");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_summary(report: &Report) {
    println!("Initial cash:  {:.2}", report.initial_cash);
    println!("Final equity:  {:.2}", report.final_equity);
    println!("Return:        {:.2}%", report.total_return * 100.0);
    println!("Max drawdown:  {:.2}%", report.max_drawdown * 100.0);
    println!(
        "Win rate:      {:.1}% over {} round trips",
        report.win_rate * 100.0,
        report.round_trip_count
    );
    println!("Trades:");
    for fill in &report.fills {
        println!(
            "  {:4} at {} price {:.2} qty {}",
            fill.side.to_string(),
            fill.timestamp,
            fill.price,
            fill.quantity
        );
    }
    if !report.skipped.is_empty() {
        println!("Skipped signals:");
        for skip in &report.skipped {
            println!("  {} {}: {}", skip.timestamp, skip.side, skip.reason);
        }
    }
}

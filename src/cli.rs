//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{BacktestRequest, BacktestResult};
use crate::domain::config_validation::{
    build_request, grid_from_config, objective_from_config, symbols_from_config,
    validate_backtest_config,
};
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::StrategyKind;
use crate::domain::sweep::{run_batch, run_sweep, Objective, ParameterGrid};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_TOP: i64 = 10;

/// `symbol = *` runs every symbol the data source lists.
pub const ALL_SYMBOLS: &str = "*";

#[derive(Parser, Debug)]
#[command(name = "backtest-pipeline", about = "Signal-to-performance strategy backtester")]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for every configured symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding <SYMBOL>.csv files
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        symbol: Option<String>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sweep the [sweep] grid and rank the runs
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        symbol: Option<String>,
        /// sharpe, final_return, calmar or annual_return
        #[arg(long)]
        objective: Option<String>,
        /// Number of ranked runs to print
        #[arg(long)]
        top: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List supported strategies and their default parameters
    Strategies,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            symbol,
            output,
        } => run_backtest(&config, &data, symbol.as_deref(), output.as_deref()),
        Command::Sweep {
            config,
            data,
            symbol,
            objective,
            top,
            output,
        } => run_sweep_command(
            &config,
            &data,
            symbol.as_deref(),
            objective.as_deref(),
            top,
            output.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => run_strategies(),
    }
}

fn fail(err: &BacktestError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    FileConfigAdapter::from_file(path).map_err(|e| BacktestError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn request_and_grid(
    config: &dyn ConfigPort,
) -> Result<(BacktestRequest, ParameterGrid), BacktestError> {
    Ok((build_request(config)?, grid_from_config(config)?))
}

fn resolve_symbols(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    match symbol_override {
        Some(s) => s
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => symbols_from_config(config),
    }
}

fn expand_symbols(data_port: &dyn DataPort, symbols: &[String]) -> Result<Vec<String>, BacktestError> {
    if !symbols.iter().any(|s| s == ALL_SYMBOLS) {
        return Ok(symbols.to_vec());
    }
    let listed = data_port.list_symbols()?;
    if listed.is_empty() {
        return Err(BacktestError::Data {
            reason: "data source lists no symbols".into(),
        });
    }
    tracing::info!(symbols = listed.len(), "expanded symbol wildcard");
    Ok(listed)
}

fn run_backtest(
    config_path: &Path,
    data_dir: &Path,
    symbol_override: Option<&str>,
    output_path: Option<&Path>,
) -> ExitCode {
    tracing::info!(config = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let request = match build_request(&adapter) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let symbols = resolve_symbols(symbol_override, &adapter);

    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    run_backtest_pipeline(&data_port, &JsonReportAdapter::new(), &request, &symbols, output_path)
}

/// Fetch, run and report for each symbol. Symbols that fail are reported
/// and skipped; the exit code reflects the first failure.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    request: &BacktestRequest,
    symbols: &[String],
    output_path: Option<&Path>,
) -> ExitCode {
    if symbols.is_empty() {
        return fail(&BacktestError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        });
    }
    let symbols = match expand_symbols(data_port, symbols) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let mut first_error: Option<BacktestError> = None;
    let mut series: Vec<(String, Vec<Bar>)> = Vec::new();
    for symbol in &symbols {
        match data_port.fetch_bars(symbol, request.start_date, request.end_date) {
            Ok(bars) => {
                tracing::info!(symbol = %symbol, bars = bars.len(), "bars loaded");
                series.push((symbol.clone(), bars));
            }
            Err(e) => {
                eprintln!("error: {symbol}: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    tracing::info!(strategy = %request.strategy, symbols = series.len(), "running backtest");
    let mut results: Vec<BacktestResult> = Vec::new();
    for (symbol, outcome) in run_batch(request, &series) {
        match outcome {
            Ok(result) => {
                print_summary(&result);
                results.push(result);
            }
            Err(e) => {
                eprintln!("error: {symbol}: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    let written = match (output_path, results.as_slice()) {
        (_, []) => Ok(()),
        (Some(path), [single]) => report_port.write(single, path),
        (Some(path), many) => report_port.write_batch(many, path),
        (None, [single]) => print_json(single),
        (None, many) => print_json(&many),
    };
    if let Err(e) = written {
        return fail(&e);
    }

    match first_error {
        Some(e) => (&e).into(),
        None => ExitCode::SUCCESS,
    }
}

fn run_sweep_command(
    config_path: &Path,
    data_dir: &Path,
    symbol_override: Option<&str>,
    objective_override: Option<&str>,
    top: Option<usize>,
    output_path: Option<&Path>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let (request, grid) = match request_and_grid(&adapter) {
        Ok(pair) => pair,
        Err(e) => return fail(&e),
    };
    let objective = match objective_override {
        Some(raw) => raw.parse::<Objective>().map(Some),
        None => objective_from_config(&adapter),
    };
    let objective = match objective {
        Ok(o) => o.unwrap_or(Objective::Sharpe),
        Err(e) => return fail(&e),
    };
    let top = top.unwrap_or_else(|| adapter.get_int("sweep", "top", DEFAULT_TOP).max(1) as usize);

    let symbol = match resolve_symbols(symbol_override, &adapter).into_iter().next() {
        Some(s) => s,
        None => {
            return fail(&BacktestError::ConfigMissing {
                section: "backtest".into(),
                key: "symbol".into(),
            })
        }
    };
    let mut request = request;
    request.symbol = symbol;

    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    run_sweep_pipeline(
        &data_port,
        &JsonReportAdapter::new(),
        &request,
        &grid,
        objective,
        top,
        output_path,
    )
}

pub fn run_sweep_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    request: &BacktestRequest,
    grid: &ParameterGrid,
    objective: Objective,
    top: usize,
    output_path: Option<&Path>,
) -> ExitCode {
    if let Err(e) = request.strategy.parse::<StrategyKind>() {
        return fail(&e);
    }
    if request.symbol == ALL_SYMBOLS {
        return fail(&BacktestError::ConfigInvalid {
            section: "backtest".into(),
            key: "symbol".into(),
            reason: "a sweep runs against a single symbol".into(),
        });
    }
    let bars = match data_port.fetch_bars(&request.symbol, request.start_date, request.end_date) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    let report = run_sweep(request, &bars, grid, objective);
    eprintln!(
        "Sweep: {} runs, {} failed, ranked by {}",
        report.runs.len() + report.failures.len(),
        report.failures.len(),
        objective
    );
    for run in report.runs.iter().take(top) {
        eprintln!(
            "  #{:<3} {:>10.4}  {}",
            run.rank, run.score, run.result.parameters
        );
    }
    for failed in &report.failures {
        eprintln!("  failed: {} ({})", failed.parameters, failed.error);
    }

    let written = match output_path {
        Some(path) => report_port.write_sweep(&report, path),
        None => print_json(&report),
    };
    if let Err(e) = written {
        return fail(&e);
    }

    if report.runs.is_empty() && !report.failures.is_empty() {
        eprintln!("error: every sweep run failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    let (request, grid) = match request_and_grid(&adapter) {
        Ok(pair) => pair,
        Err(e) => return fail(&e),
    };

    eprintln!("Config OK");
    eprintln!("  strategy:   {}", request.strategy);
    eprintln!("  symbols:    {}", symbols_from_config(&adapter).join(", "));
    eprintln!("  frequency:  {}", request.frequency);
    eprintln!(
        "  costs:      leverage {} commission {} slippage {}",
        request.leverage, request.commission_rate, request.slippage_rate
    );
    if !request.parameters.is_empty() {
        eprintln!("  parameters: {}", request.parameters);
    }
    if !grid.is_empty() {
        eprintln!("  sweep:      {} combinations", grid.size());
    }
    ExitCode::SUCCESS
}

fn run_strategies() -> ExitCode {
    for kind in StrategyKind::all() {
        println!("{:<16} {}", kind.id(), kind.description());
        println!("{:<16} defaults: {}", "", kind.default_parameters());
    }
    ExitCode::SUCCESS
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), BacktestError> {
    println!("{}", JsonReportAdapter::render(value)?);
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let r = &result.report;
    eprintln!("{} [{}] {}", result.symbol, result.strategy, result.parameters);
    if let (Some(first), Some(last)) = (result.time_range.first_bar, result.time_range.last_bar) {
        eprintln!("  Range:         {} .. {} ({} bars)", first, last, result.time_range.bar_count);
    }
    eprintln!("  Final return:  {:.2}%", r.final_return * 100.0);
    eprintln!("  Annual return: {:.2}%", r.annual_return * 100.0);
    eprintln!("  Max drawdown:  {:.2}%", r.max_drawdown * 100.0);
    eprintln!("  Sharpe:        {:.4}", r.sharpe);
    eprintln!("  Sortino:       {:.4}", r.sortino);
    eprintln!("  Calmar:        {:.4}", r.calmar);
    eprintln!("  Trades:        {} (win rate {:.1}%)", r.total_trades, r.win_rate * 100.0);
    eprintln!("  VaR/CVaR 95:   {:.4} / {:.4}", r.var_95, r.cvar_95);
    for d in &r.diagnostics {
        eprintln!("  note: {d}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backtest_command() {
        let cli = Cli::try_parse_from([
            "backtest-pipeline",
            "-v",
            "backtest",
            "--config",
            "run.ini",
            "--data",
            "bars",
            "--symbol",
            "BTCUSDT",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Backtest { config, symbol, output, .. } => {
                assert_eq!(config, PathBuf::from("run.ini"));
                assert_eq!(symbol.as_deref(), Some("BTCUSDT"));
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_sweep_options() {
        let cli = Cli::try_parse_from([
            "backtest-pipeline",
            "sweep",
            "-c",
            "run.ini",
            "-d",
            "bars",
            "--objective",
            "calmar",
            "--top",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Sweep { objective, top, .. } => {
                assert_eq!(objective.as_deref(), Some("calmar"));
                assert_eq!(top, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn symbol_override_is_a_list() {
        let config = FileConfigAdapter::from_string("[backtest]\nsymbol = A\n").unwrap();
        assert_eq!(resolve_symbols(Some("X, Y"), &config), vec!["X", "Y"]);
        assert_eq!(resolve_symbols(None, &config), vec!["A"]);
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let err = load_config(Path::new("/nonexistent/run.ini")).err().unwrap();
        assert!(matches!(err, BacktestError::ConfigParse { .. }));
    }
}

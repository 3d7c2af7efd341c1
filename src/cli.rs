//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_position_adapter::JsonPositionAdapter;
use crate::adapters::log_notifier::LogNotifier;
use crate::adapters::simulated_execution::SimulatedExecution;
use crate::domain::config::RuntimeConfig;
use crate::domain::config_validation::{BOT_SECTION, load_runtime_config};
use crate::domain::error::SignalError;
use crate::domain::runner::{Evaluation, Runner};
use crate::logging;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Rule-based trading signal bot")]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the trading loop
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Evaluate one symbol once without placing orders
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    logging::init_logging(cli.json_logs);

    let result = match cli.command {
        Command::Run { config, ticks } => run_bot(&config, ticks),
        Command::Evaluate { config, symbol } => run_evaluate(&config, &symbol),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, SignalError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    load_runtime_config(&adapter)
}

/// Adapters wired from `[bot]` settings. Execution is always simulated.
pub struct Wiring {
    pub market: CsvAdapter,
    pub execution: SimulatedExecution,
    pub positions: JsonPositionAdapter,
    pub ledger: CsvLedgerAdapter,
    pub notifier: LogNotifier,
}

impl Wiring {
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, SignalError> {
        if !config.bot.dry_run {
            return Err(SignalError::invalid(
                BOT_SECTION,
                "dry_run",
                "live execution needs an exchange adapter; only dry_run = true is supported",
            ));
        }
        Ok(Wiring {
            market: CsvAdapter::new(config.bot.data_dir.clone(), config.bot.timeframe.clone()),
            execution: SimulatedExecution::new(),
            positions: JsonPositionAdapter::new(config.bot.position_file.clone()),
            ledger: CsvLedgerAdapter::new(config.bot.ledger_file.clone()),
            notifier: LogNotifier,
        })
    }

    pub fn runner(&self, config: RuntimeConfig) -> Result<Runner<'_>, SignalError> {
        let strategy = config.bot.strategy.build();
        Runner::new(
            config,
            strategy,
            &self.market,
            &self.execution,
            &self.positions,
            vec![&self.notifier, &self.ledger],
        )
    }
}

fn run_bot(config_path: &Path, ticks: Option<u64>) -> Result<(), SignalError> {
    info!(config = %config_path.display(), "loading config");
    let config = load_config(config_path)?;
    let wiring = Wiring::from_config(&config)?;
    let interval = Duration::from_secs(config.bot.interval_secs);

    info!(
        symbols = ?config.bot.symbols,
        strategy = %config.bot.strategy,
        interval_secs = config.bot.interval_secs,
        "bot started (dry run)"
    );

    let mut runner = wiring.runner(config)?;
    run_loop(&mut runner, ticks, interval)
}

/// Tick all symbols every `interval`. Recoverable per-symbol errors are
/// logged and the symbol is skipped for that tick; anything else stops the loop.
pub fn run_loop(runner: &mut Runner<'_>, ticks: Option<u64>, interval: Duration) -> Result<(), SignalError> {
    let mut completed = 0u64;
    loop {
        for (symbol, outcome) in runner.run_once() {
            match outcome {
                Ok(outcome) => debug!(symbol, verdict = %outcome.verdict, "tick complete"),
                Err(e) if e.is_recoverable() => {
                    warn!(symbol, error = %e, "skipping symbol this tick")
                }
                Err(e) => return Err(e),
            }
        }

        completed += 1;
        if ticks.is_some_and(|limit| completed >= limit) {
            info!(ticks = completed, "tick limit reached");
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

fn run_evaluate(config_path: &Path, symbol: &str) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    let symbol = symbol.trim().to_uppercase();
    if config.symbol(&symbol).is_none() {
        return Err(SignalError::ConfigMissing {
            section: symbol,
            key: "amount".to_string(),
        });
    }

    let wiring = Wiring::from_config(&config)?;
    let runner = wiring.runner(config)?;
    let evaluation = runner.evaluate(&symbol)?;
    print!("{}", format_evaluation(&evaluation));
    Ok(())
}

/// Human-readable report of a read-only evaluation.
pub fn format_evaluation(e: &Evaluation) -> String {
    let mut out = String::new();
    out.push_str(&format!("Symbol:   {}\n", e.symbol));
    out.push_str(&format!("Price:    {:.6}\n", e.price));
    out.push_str(&format!("Bars:     {}\n", e.bars));

    if e.snapshot.is_empty() {
        out.push_str("Indicators: insufficient history\n");
    } else {
        let last = |s: &[f64]| s.last().copied().unwrap_or(f64::NAN);
        if let Some(ts) = e.snapshot.last_timestamp() {
            out.push_str(&format!("Bar time: {}\n", ts.to_rfc3339()));
        }
        out.push_str(&format!(
            "DIF {:.6}  DEA {:.6}\n",
            last(&e.snapshot.dif),
            last(&e.snapshot.dea)
        ));
        out.push_str(&format!(
            "K {:.2}  D {:.2}  J {:.2}\n",
            last(&e.snapshot.k),
            last(&e.snapshot.d),
            last(&e.snapshot.j)
        ));
        out.push_str(&format!("ATR {:.6}\n", last(&e.snapshot.atr)));
    }

    match e.position.entry() {
        Some((entry, amount)) => out.push_str(&format!(
            "Position: holding {amount} @ {entry:.6} (stop {}, peak {})\n",
            fmt_opt(e.position.trailing_stop_price),
            fmt_opt(e.position.max_price)
        )),
        None => out.push_str("Position: flat\n"),
    }
    out.push_str(&format!("Verdict:  {}\n", e.verdict));
    out
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_else(|| "-".to_string())
}

fn run_validate(config_path: &Path) -> Result<(), SignalError> {
    let config = load_config(config_path)?;

    println!("Config OK: {}", config_path.display());
    println!(
        "Strategy: {}  interval: {}s  timeframe: {}  bars: {}  dry_run: {}",
        config.bot.strategy,
        config.bot.interval_secs,
        config.bot.timeframe,
        config.bot.bar_limit,
        config.bot.dry_run
    );
    for symbol in &config.symbols {
        let priority: Vec<&str> = symbol.stop_loss_priority.iter().map(|m| m.as_str()).collect();
        println!(
            "  {}: amount {}  warm-up {} bars  stop-loss order [{}]",
            symbol.symbol,
            symbol.amount,
            symbol.indicators.required_bars(),
            priority.join(", ")
        );
    }
    if !config.bot.dry_run {
        warn!("dry_run = false: `run` will refuse to start without an exchange adapter");
    }
    Ok(())
}

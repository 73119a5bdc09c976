//! SigLab CLI — live signals, backtests, grid sweeps, and optimization.
//!
//! Commands:
//! - `signal` — compute the current multi-timeframe signal for a symbol
//! - `backtest` — simulate the signal history and report metrics
//! - `sweep` — run a full threshold × horizon grid
//! - `optimize` — search the grid for a recommended operating point

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use siglab_core::data::{BinanceProvider, SystemClock};
use siglab_runner::backtest::{ExecutionMode, TieBreak};
use siglab_runner::config::ServiceConfig;
use siglab_runner::export::save_artifacts;
use siglab_runner::metrics::BacktestReport;
use siglab_runner::optimizer::OptimizeRequest;
use siglab_runner::service::{BacktestRequest, SignalOutcome, SignalService, SweepRequest};

#[derive(Parser)]
#[command(
    name = "siglab",
    about = "SigLab CLI — multi-timeframe trading signals and backtests"
)]
struct Cli {
    /// Path to a TOML service config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the current multi-timeframe signal for a symbol.
    Signal {
        /// Symbol to query (e.g., BTCUSDT).
        symbol: String,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Simulate the signal history and report metrics.
    Backtest {
        /// Symbol to backtest (e.g., BTCUSDT).
        symbol: String,

        /// Minimum score a signal must carry to become a trade.
        #[arg(long, default_value_t = 0.6)]
        threshold: f64,

        /// Forward window in 15-minute bars.
        #[arg(long, default_value_t = 4)]
        horizon: usize,

        /// Base bars to fetch (100-1000).
        #[arg(long, default_value_t = 400)]
        limit: usize,

        /// Commission in basis points per side.
        #[arg(long, default_value_t = 4.0)]
        commission_bps: f64,

        /// Slippage in basis points per side.
        #[arg(long, default_value_t = 1.0)]
        slippage_bps: f64,

        /// Position size multiplier.
        #[arg(long, default_value_t = 1.0)]
        position_size: f64,

        /// Exit mode: horizon or target_stop.
        #[arg(long, default_value = "horizon")]
        mode: String,

        /// Ambiguous-bar tie break: stop_first or target_first.
        #[arg(long, default_value = "stop_first")]
        tie_break: String,

        /// Attach a bootstrap confidence interval with this many resamples.
        #[arg(long)]
        bootstrap: Option<usize>,

        /// Output directory for report.json, trades.csv, equity.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run a full threshold × horizon grid and rank the cells.
    Sweep {
        /// Symbol to sweep (e.g., BTCUSDT).
        symbol: String,

        /// Comma-separated thresholds (e.g., 0.4,0.5,0.6).
        #[arg(long, default_value = "0.4,0.5,0.6,0.7")]
        thresholds: String,

        /// Comma-separated horizons (e.g., 2,4,6).
        #[arg(long, default_value = "2,4,6")]
        horizons: String,

        /// Base bars to fetch (100-1000).
        #[arg(long, default_value_t = 400)]
        limit: usize,

        /// Print all cell reports as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Search the grid for a recommended threshold and horizon.
    Optimize {
        /// Symbol to optimize (e.g., BTCUSDT).
        symbol: String,

        /// Comma-separated thresholds to evaluate.
        #[arg(long, default_value = "0.4,0.5,0.6,0.7")]
        thresholds: String,

        /// Comma-separated horizons to evaluate.
        #[arg(long, default_value = "2,4,6")]
        horizons: String,

        /// Base bars to fetch (100-1000).
        #[arg(long, default_value_t = 400)]
        limit: usize,

        /// Hit rate the recommendation should reach (0.5-0.9).
        #[arg(long, default_value_t = 0.55)]
        target_hit: f64,

        /// Minimum trade count for a qualified candidate.
        #[arg(long, default_value_t = 10)]
        min_trades: usize,

        /// Evaluate each cell across contiguous time folds.
        #[arg(long, default_value_t = false)]
        walkforward: bool,

        /// Number of walk-forward folds.
        #[arg(long, default_value_t = 3)]
        folds: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    let service = SignalService::new(BinanceProvider::default(), SystemClock, config);

    match cli.command {
        Commands::Signal { symbol, json } => run_signal(&service, &symbol, json),
        Commands::Backtest {
            symbol,
            threshold,
            horizon,
            limit,
            commission_bps,
            slippage_bps,
            position_size,
            mode,
            tie_break,
            bootstrap,
            output_dir,
            json,
        } => {
            let request = BacktestRequest {
                threshold,
                limit,
                horizon,
                commission_bps,
                slippage_bps,
                position_size,
                mode: parse_mode(&mode)?,
                tie_break: parse_tie_break(&tie_break)?,
                bootstrap_samples: bootstrap,
            };
            run_backtest(&service, &symbol, &request, &output_dir, json)
        }
        Commands::Sweep {
            symbol,
            thresholds,
            horizons,
            limit,
            json,
        } => {
            let request = SweepRequest {
                thresholds: parse_f64_list(&thresholds)?,
                horizons: parse_usize_list(&horizons)?,
                limit,
                ..SweepRequest::default()
            };
            run_sweep(&service, &symbol, &request, json)
        }
        Commands::Optimize {
            symbol,
            thresholds,
            horizons,
            limit,
            target_hit,
            min_trades,
            walkforward,
            folds,
        } => {
            let request = OptimizeRequest {
                thresholds: parse_f64_list(&thresholds)?,
                horizons: parse_usize_list(&horizons)?,
                target_hit,
                min_trades,
                walkforward,
                folds,
            };
            run_optimize(&service, &symbol, limit, &request)
        }
    }
}

// ─── Argument parsing ────────────────────────────────────────────────

fn parse_mode(s: &str) -> Result<ExecutionMode> {
    match s {
        "horizon" => Ok(ExecutionMode::Horizon),
        "target_stop" => Ok(ExecutionMode::TargetStop),
        _ => bail!("unknown mode '{s}'. Valid: horizon, target_stop"),
    }
}

fn parse_tie_break(s: &str) -> Result<TieBreak> {
    match s {
        "stop_first" => Ok(TieBreak::StopFirst),
        "target_first" => Ok(TieBreak::TargetFirst),
        _ => bail!("unknown tie break '{s}'. Valid: stop_first, target_first"),
    }
}

fn parse_f64_list(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|part| Ok(part.trim().parse::<f64>()?))
        .collect()
}

fn parse_usize_list(s: &str) -> Result<Vec<usize>> {
    s.split(',')
        .map(|part| Ok(part.trim().parse::<usize>()?))
        .collect()
}

// ─── Commands ────────────────────────────────────────────────────────

type Service = SignalService<BinanceProvider, SystemClock>;

fn run_signal(service: &Service, symbol: &str, json: bool) -> Result<()> {
    let outcome = service.compute_signal(symbol)?;
    let report = outcome.report();

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!("=== Signal: {} ===", report.symbol);
    println!("Side:           {}", report.side);
    println!("Score:          {:.3}", report.score);
    println!("Threshold:      {:.3}", report.threshold);
    if let Some(price) = report.price {
        println!("Price:          {price:.2}");
    }
    if let (Some(sl), Some(tp)) = (report.stop_loss, report.take_profit) {
        println!("Stop Loss:      {sl:.2}");
        println!("Take Profit:    {tp:.2}");
    }
    println!(
        "Votes:          base {:+.2} / 1h {:+.2} / 4h {:+.2}",
        report.votes.base, report.votes.h1, report.votes.h4
    );
    println!(
        "Filters:        adx_ok={} vol_ok={}",
        report.filters.adx_ok, report.filters.vol_ok
    );
    println!("As of:          {}", report.as_of.to_rfc3339());
    if let SignalOutcome::Degraded { reason, .. } = &outcome {
        println!();
        println!("WARNING: stale signal ({reason})");
    }
    println!();
    Ok(())
}

fn run_backtest(
    service: &Service,
    symbol: &str,
    request: &BacktestRequest,
    output_dir: &PathBuf,
    json: bool,
) -> Result<()> {
    let report = service.backtest(symbol, request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report_summary(&report);
    }

    let run_dir = save_artifacts(output_dir, &report)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_sweep(service: &Service, symbol: &str, request: &SweepRequest, json: bool) -> Result<()> {
    let reports = service.sweep(symbol, request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!();
    println!("=== Sweep: {symbol} ({} cells) ===", reports.len());
    println!(
        "{:>9} {:>7} {:>7} {:>9} {:>9} {:>8}",
        "Threshold", "Horizon", "Trades", "Hit Rate", "Net Ret", "PF"
    );
    for report in &reports {
        println!(
            "{:>9.2} {:>7} {:>7} {:>8.1}% {:>8.2}% {:>8.2}",
            report.threshold,
            report.horizon,
            report.trades,
            report.hit_rate * 100.0,
            report.net_return_sum * 100.0,
            report.profit_factor,
        );
    }
    println!();
    Ok(())
}

fn run_optimize(
    service: &Service,
    symbol: &str,
    limit: usize,
    request: &OptimizeRequest,
) -> Result<()> {
    let candidate = service.optimize(symbol, limit, request)?;

    println!();
    println!("=== Optimizer: {symbol} ===");
    println!("Threshold:      {:.2}", candidate.threshold);
    println!("Horizon:        {}", candidate.horizon);
    println!("Trades:         {}", candidate.trades);
    println!("Hit Rate:       {:.1}%", candidate.hit_rate * 100.0);
    println!("Profit Factor:  {:.2}", candidate.profit_factor);
    println!("Net Return Sum: {:.2}%", candidate.net_return_sum * 100.0);
    println!();
    Ok(())
}

fn print_report_summary(report: &BacktestReport) {
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", report.symbol);
    println!(
        "Params:         threshold {:.2}, horizon {}, limit {}",
        report.threshold, report.horizon, report.limit
    );
    println!("Trades:         {}", report.trades);
    println!();
    println!("--- Performance ---");
    println!("Net Return:     {:.2}%", report.net_return_sum * 100.0);
    println!("Hit Rate:       {:.1}%", report.hit_rate * 100.0);
    println!("Expectancy:     {:.4}", report.expectancy);
    println!("Sharpe:         {:.3}", report.sharpe);
    println!("Sortino:        {:.3}", report.sortino);
    println!("Max Drawdown:   {:.2}%", report.max_drawdown * 100.0);
    println!("Profit Factor:  {:.2}", report.profit_factor);
    println!("Win/Loss Ratio: {:.2}", report.win_loss_ratio);
    println!(
        "Streaks:        {} wins / {} losses",
        report.streaks.longest_win, report.streaks.longest_loss
    );
    println!(
        "Exposure:       {} bars ({:.1} hours, {:.0}% of window)",
        report.exposure.bars,
        report.exposure.hours,
        report.exposure.ratio * 100.0
    );
    if let Some(interval) = &report.bootstrap {
        println!();
        println!("--- Bootstrap ({} resamples) ---", interval.samples);
        println!(
            "Hit Rate 95% CI:   [{:.1}%, {:.1}%]",
            interval.hit_rate_low * 100.0,
            interval.hit_rate_high * 100.0
        );
        println!(
            "Expectancy 95% CI: [{:.4}, {:.4}]",
            interval.expectancy_low, interval.expectancy_high
        );
    }
    println!();
}

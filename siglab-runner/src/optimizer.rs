//! Parameter optimizer — threshold × horizon grid search with optional
//! walk-forward folds.
//!
//! The optimizer never fails: when no cell clears the qualification bar it
//! degrades to the candidate nearest the target hit rate, and when even that
//! is impossible (an empty grid) to a zero-filled placeholder.

use serde::{Deserialize, Serialize};

use siglab_core::domain::{Bar, SignalRow};

use crate::backtest::{simulate, BacktestParams};

/// Profit factor a qualified candidate must reach.
const MIN_PROFIT_FACTOR: f64 = 1.3;
/// Rows each walk-forward fold must contain.
const MIN_ROWS_PER_FOLD: usize = 50;

// ─── Request and candidate ───────────────────────────────────────────

/// Grid and selection criteria for one optimizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub thresholds: Vec<f64>,
    pub horizons: Vec<usize>,
    /// Hit rate the recommended operating point should reach.
    pub target_hit: f64,
    /// Minimum trade count for a qualified candidate.
    pub min_trades: usize,
    /// Evaluate each cell across contiguous time folds instead of the whole
    /// history. Silently skipped when the history is too short.
    pub walkforward: bool,
    pub folds: usize,
}

impl Default for OptimizeRequest {
    fn default() -> Self {
        Self {
            thresholds: vec![0.4, 0.5, 0.6, 0.7],
            horizons: vec![2, 4, 6],
            target_hit: 0.55,
            min_trades: 10,
            walkforward: false,
            folds: 3,
        }
    }
}

/// One evaluated grid cell; the selected candidate is cached per symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerCandidate {
    pub threshold: f64,
    pub horizon: usize,
    pub trades: usize,
    pub hit_rate: f64,
    pub profit_factor: f64,
    pub net_return_sum: f64,
}

impl OptimizerCandidate {
    fn placeholder(threshold: f64, horizon: usize) -> Self {
        Self {
            threshold,
            horizon,
            trades: 0,
            hit_rate: 0.0,
            profit_factor: 0.0,
            net_return_sum: 0.0,
        }
    }
}

// ─── Evaluation ──────────────────────────────────────────────────────

/// Candidate statistics from one simulator run.
fn cell_stats(rows: &[SignalRow], bars: &[Bar], params: &BacktestParams) -> (usize, f64, f64, f64) {
    let trades = simulate(rows, bars, params);
    let n = trades.len();
    if n == 0 {
        return (0, 0.0, 0.0, 0.0);
    }
    let hit_rate = trades.iter().filter(|t| t.net_value > 0.0).count() as f64 / n as f64;
    let wins: f64 = trades.iter().map(|t| t.net_value).filter(|v| *v > 0.0).sum();
    let losses: f64 = trades.iter().map(|t| t.net_value).filter(|v| *v < 0.0).sum();
    let profit_factor = if losses.abs() > 1e-12 {
        wins.abs() / losses.abs()
    } else if wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    let net_return_sum = trades.iter().map(|t| t.net_return).sum();
    (n, hit_rate, profit_factor, net_return_sum)
}

/// Evaluate one cell, whole-history or per fold.
///
/// In walk-forward mode the history splits into `folds` contiguous
/// equal-length ranges (the last absorbs the remainder); hit rate and profit
/// factor are averaged across folds, trades and net return summed.
fn evaluate_cell(
    rows: &[SignalRow],
    bars: &[Bar],
    params: &BacktestParams,
    request: &OptimizeRequest,
) -> OptimizerCandidate {
    let use_folds = request.walkforward
        && request.folds >= 2
        && rows.len() >= request.folds * MIN_ROWS_PER_FOLD;

    let (trades, hit_rate, profit_factor, net_return_sum) = if use_folds {
        let folds = request.folds;
        let fold_len = rows.len() / folds;
        let mut trades = 0usize;
        let mut hit_sum = 0.0;
        let mut pf_sum = 0.0;
        let mut net_sum = 0.0;
        for f in 0..folds {
            let start = f * fold_len;
            let end = if f == folds - 1 { rows.len() } else { start + fold_len };
            let (t, h, pf, net) = cell_stats(&rows[start..end], &bars[start..end], params);
            trades += t;
            hit_sum += h;
            pf_sum += pf;
            net_sum += net;
        }
        (trades, hit_sum / folds as f64, pf_sum / folds as f64, net_sum)
    } else {
        cell_stats(rows, bars, params)
    };

    OptimizerCandidate {
        threshold: params.threshold,
        horizon: params.horizon,
        trades,
        hit_rate,
        profit_factor,
        net_return_sum,
    }
}

/// Run the grid search and select the recommended operating point.
///
/// Selection: among candidates with hit_rate >= target, trades >= min_trades
/// and profit_factor >= 1.3, the one with the highest net return sum; when
/// none qualifies, the candidate nearest the target hit rate (ties broken by
/// higher net return sum).
pub fn optimize_grid(
    rows: &[SignalRow],
    bars: &[Bar],
    base_params: &BacktestParams,
    request: &OptimizeRequest,
) -> OptimizerCandidate {
    let mut qualified: Option<OptimizerCandidate> = None;
    let mut nearest: Option<OptimizerCandidate> = None;

    for &threshold in &request.thresholds {
        for &horizon in &request.horizons {
            let params = BacktestParams {
                threshold,
                horizon,
                ..*base_params
            };
            let candidate = evaluate_cell(rows, bars, &params, request);

            let is_better_nearest = match &nearest {
                None => true,
                Some(best) => {
                    let d_new = (candidate.hit_rate - request.target_hit).abs();
                    let d_best = (best.hit_rate - request.target_hit).abs();
                    d_new < d_best
                        || (d_new == d_best && candidate.net_return_sum > best.net_return_sum)
                }
            };
            if is_better_nearest {
                nearest = Some(candidate);
            }

            if candidate.hit_rate >= request.target_hit
                && candidate.trades >= request.min_trades
                && candidate.profit_factor >= MIN_PROFIT_FACTOR
            {
                let is_better = qualified
                    .map(|best| candidate.net_return_sum > best.net_return_sum)
                    .unwrap_or(true);
                if is_better {
                    qualified = Some(candidate);
                }
            }
        }
    }

    qualified.or(nearest).unwrap_or_else(|| {
        OptimizerCandidate::placeholder(
            request.thresholds.first().copied().unwrap_or(0.6),
            request.horizons.first().copied().unwrap_or(4),
        )
    })
}

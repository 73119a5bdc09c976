//! Grid sweep: a full report for every threshold × horizon cell.
//!
//! Cells are independent pure computations over the same signal history,
//! so they run on the rayon pool. Results keep grid order (thresholds
//! outer, horizons inner) regardless of completion order.

use rayon::prelude::*;

use siglab_core::domain::{Bar, SignalRow};

use crate::backtest::{simulate, BacktestParams};
use crate::metrics::BacktestReport;

/// Run the full grid and return one report per cell, in grid order.
pub fn sweep_grid(
    symbol: &str,
    rows: &[SignalRow],
    bars: &[Bar],
    base_params: &BacktestParams,
    limit: usize,
    thresholds: &[f64],
    horizons: &[usize],
) -> Vec<BacktestReport> {
    let cells: Vec<(f64, usize)> = thresholds
        .iter()
        .flat_map(|&t| horizons.iter().map(move |&h| (t, h)))
        .collect();

    cells
        .into_par_iter()
        .map(|(threshold, horizon)| {
            let params = BacktestParams {
                threshold,
                horizon,
                ..*base_params
            };
            let trades = simulate(rows, bars, &params);
            BacktestReport::compute(symbol, &params, limit, &trades)
        })
        .collect()
}

//! Artifact export: report JSON, trade CSV, and equity CSV for one run.
//!
//! Files land under `<dir>/<run_id>/` so repeated runs with the same inputs
//! overwrite their own artifacts instead of piling up.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::metrics::BacktestReport;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Serialize)]
struct TradeRecord<'a> {
    time: String,
    side: &'a str,
    score: f64,
    fwd_return: f64,
    gross_return: f64,
    net_return: f64,
    gross_value: f64,
    net_value: f64,
}

#[derive(Serialize)]
struct EquityRecord {
    time: String,
    net_value: f64,
}

/// Write `report.json`, `trades.csv`, and `equity.csv` for one report and
/// return the run directory.
pub fn save_artifacts(dir: &Path, report: &BacktestReport) -> Result<PathBuf, ExportError> {
    let run_dir = dir.join(&report.run_id);
    fs::create_dir_all(&run_dir)?;

    let json = serde_json::to_string_pretty(report)?;
    fs::write(run_dir.join("report.json"), json)?;

    let mut trades = csv::Writer::from_path(run_dir.join("trades.csv"))?;
    for t in &report.history {
        trades.serialize(TradeRecord {
            time: t.time.to_rfc3339(),
            side: match t.side {
                siglab_core::domain::Side::Buy => "BUY",
                siglab_core::domain::Side::Sell => "SELL",
                siglab_core::domain::Side::Hold => "HOLD",
            },
            score: t.score,
            fwd_return: t.fwd_return,
            gross_return: t.gross_return,
            net_return: t.net_return,
            gross_value: t.gross_value,
            net_value: t.net_value,
        })?;
    }
    trades.flush()?;

    let mut equity = csv::Writer::from_path(run_dir.join("equity.csv"))?;
    for point in &report.equity_curve {
        equity.serialize(EquityRecord {
            time: point.time.to_rfc3339(),
            net_value: point.net_value,
        })?;
    }
    equity.flush()?;

    Ok(run_dir)
}

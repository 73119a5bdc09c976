//! SigLab Core — domain types, indicator pipeline, regime/vote model,
//! signal history, and market data.
//!
//! This crate contains the signal engine:
//! - Domain types (bars, timeframes, sides, votes, signal rows)
//! - Indicator pipeline: bar sequence → enriched bar sequence
//! - Regime-filtered vote model: enriched bars → (side, score)
//! - Multi-timeframe signal history builder
//! - Market-data provider trait, the Binance implementation, TTL caches
//!
//! Backtesting, metrics, and optimization live in `siglab-runner`.

pub mod data;
pub mod domain;
pub mod history;
pub mod indicators;
pub mod signal;

pub use history::{build_signal_history, MIN_BARS};

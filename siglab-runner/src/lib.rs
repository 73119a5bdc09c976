//! Backtest and service layer: simulator, metrics aggregator, bootstrap,
//! optimizer, grid sweep, artifact export, and the signal service that ties
//! them to the data layer.

pub mod backtest;
pub mod bootstrap;
pub mod config;
pub mod export;
pub mod metrics;
pub mod optimizer;
pub mod service;
pub mod sweep;

pub use backtest::{simulate, BacktestParams, ExecutionMode, SimulatedTrade, TieBreak};
pub use bootstrap::{bootstrap_interval, BootstrapConfig};
pub use config::{ConfigError, ServiceConfig};
pub use export::save_artifacts;
pub use metrics::BacktestReport;
pub use optimizer::{optimize_grid, OptimizeRequest, OptimizerCandidate};
pub use service::{BacktestRequest, ServiceError, SignalOutcome, SignalService, SweepRequest};
pub use sweep::sweep_grid;

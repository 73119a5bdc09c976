//! Signal service — the operations exposed to request handlers and the CLI.
//!
//! Wires the data provider, the three TTL caches, and the core pipeline
//! into four operations: live signal, backtest, sweep, and optimize.
//! Parameter validation happens here, at the boundary; the core assumes
//! validated inputs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::data::{BarProvider, Clock, DataError, TtlCache};
use siglab_core::domain::{Bar, MtfVotes, Side, SignalReport, Timeframe};
use siglab_core::indicators::enrich;
use siglab_core::signal::{
    adaptive_sl_tp, decide_side, directional_vote, dynamic_threshold, regime_filters,
};
use siglab_core::{build_signal_history, MIN_BARS};

use crate::backtest::{simulate, BacktestParams, ExecutionMode, TieBreak};
use crate::bootstrap::{bootstrap_interval, BootstrapConfig};
use crate::config::ServiceConfig;
use crate::metrics::BacktestReport;
use crate::optimizer::{optimize_grid, OptimizeRequest, OptimizerCandidate};
use crate::sweep::sweep_grid;

// ─── Errors and outcomes ─────────────────────────────────────────────

/// Errors surfaced to the request layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed parameters, rejected before any computation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Provider exhausted all sources; retryable.
    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] DataError),

    /// Too few bars on one timeframe for a usable signal.
    #[error("insufficient history on {timeframe}: {got} bars, need {need}")]
    InsufficientHistory {
        timeframe: Timeframe,
        got: usize,
        need: usize,
    },
}

/// A live signal, either freshly computed or a stale fallback served while
/// the data layer is down. Degradation is a visible branch, not an
/// exception handler.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    Fresh(SignalReport),
    Degraded { report: SignalReport, reason: String },
}

impl SignalOutcome {
    pub fn report(&self) -> &SignalReport {
        match self {
            SignalOutcome::Fresh(report) => report,
            SignalOutcome::Degraded { report, .. } => report,
        }
    }
}

// ─── Requests ────────────────────────────────────────────────────────

/// Parameters for one backtest request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub threshold: f64,
    pub limit: usize,
    pub horizon: usize,
    pub commission_bps: f64,
    pub slippage_bps: f64,
    pub position_size: f64,
    pub mode: ExecutionMode,
    pub tie_break: TieBreak,
    /// Attach a bootstrap confidence interval with this many resamples.
    pub bootstrap_samples: Option<usize>,
}

impl Default for BacktestRequest {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            limit: 400,
            horizon: 4,
            commission_bps: 4.0,
            slippage_bps: 1.0,
            position_size: 1.0,
            mode: ExecutionMode::Horizon,
            tie_break: TieBreak::StopFirst,
            bootstrap_samples: None,
        }
    }
}

impl BacktestRequest {
    fn params(&self) -> BacktestParams {
        BacktestParams {
            threshold: self.threshold,
            horizon: self.horizon,
            commission_bps: self.commission_bps,
            slippage_bps: self.slippage_bps,
            position_size: self.position_size,
            mode: self.mode,
            tie_break: self.tie_break,
        }
    }
}

/// Parameters for a full-grid sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRequest {
    pub thresholds: Vec<f64>,
    pub horizons: Vec<usize>,
    pub limit: usize,
    pub commission_bps: f64,
    pub slippage_bps: f64,
    pub position_size: f64,
    pub mode: ExecutionMode,
    pub tie_break: TieBreak,
}

impl Default for SweepRequest {
    fn default() -> Self {
        Self {
            thresholds: vec![0.4, 0.5, 0.6, 0.7],
            horizons: vec![2, 4, 6],
            limit: 400,
            commission_bps: 4.0,
            slippage_bps: 1.0,
            position_size: 1.0,
            mode: ExecutionMode::Horizon,
            tie_break: TieBreak::StopFirst,
        }
    }
}

// ─── Validation ──────────────────────────────────────────────────────

fn validate_threshold(value: f64) -> Result<(), ServiceError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "threshold must be between 0 and 1, got {value}"
        )))
    }
}

fn validate_horizon(value: usize) -> Result<(), ServiceError> {
    if (1..=50).contains(&value) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "horizon must be between 1 and 50, got {value}"
        )))
    }
}

fn validate_limit(value: usize) -> Result<(), ServiceError> {
    if (100..=1000).contains(&value) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "limit must be between 100 and 1000, got {value}"
        )))
    }
}

fn validate_costs(commission_bps: f64, slippage_bps: f64, position_size: f64) -> Result<(), ServiceError> {
    if commission_bps < 0.0 || slippage_bps < 0.0 {
        return Err(ServiceError::Validation(
            "commission/slippage cannot be negative".into(),
        ));
    }
    if position_size <= 0.0 {
        return Err(ServiceError::Validation(
            "position_size must be positive".into(),
        ));
    }
    Ok(())
}

fn validate_target_hit(value: f64) -> Result<(), ServiceError> {
    if (0.5..=0.9).contains(&value) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "target_hit must be between 0.5 and 0.9, got {value}"
        )))
    }
}

/// Higher-timeframe fetch limits scale with the base limit so the aligned
/// context always covers the base window.
fn h1_limit(base_limit: usize) -> usize {
    (base_limit / 4 + 10).max(200)
}

fn h4_limit(base_limit: usize) -> usize {
    (base_limit / 16 + 10).max(100)
}

// ─── The service ─────────────────────────────────────────────────────

type BarKey = (String, Timeframe, usize);

/// The signal service: provider + clock + caches + core pipeline.
pub struct SignalService<P: BarProvider, C: Clock> {
    provider: P,
    clock: C,
    config: ServiceConfig,
    bar_cache: TtlCache<BarKey, Vec<Bar>>,
    signal_cache: TtlCache<String, SignalReport>,
    optimizer_cache: TtlCache<String, OptimizerCandidate>,
}

impl<P: BarProvider, C: Clock> SignalService<P, C> {
    pub fn new(provider: P, clock: C, config: ServiceConfig) -> Self {
        let bar_ttl = Duration::seconds(config.bar_ttl_secs as i64);
        let signal_ttl = Duration::seconds(config.signal_ttl_secs as i64);
        let optimizer_ttl = Duration::seconds(config.optimizer_ttl_secs as i64);
        Self {
            provider,
            clock,
            config,
            bar_cache: TtlCache::new(bar_ttl),
            signal_cache: TtlCache::new(signal_ttl),
            optimizer_cache: TtlCache::new(optimizer_ttl),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Bars for one (symbol, timeframe, limit), through the raw-bar cache.
    fn bars(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Bar>, ServiceError> {
        let key = (symbol.to_string(), timeframe, limit);
        let now = self.now();
        if let Some(bars) = self.bar_cache.get(&key, now) {
            return Ok(bars);
        }
        let bars = self.provider.fetch_bars(symbol, timeframe, limit)?;
        self.bar_cache.put(key, bars.clone(), now);
        Ok(bars)
    }

    /// The three aligned timeframe series for a base window of `limit` bars,
    /// each checked against the 50-bar minimum.
    fn timeframe_bars(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<(Vec<Bar>, Vec<Bar>, Vec<Bar>), ServiceError> {
        let base = self.bars(symbol, Timeframe::M15, limit)?;
        let h1 = self.bars(symbol, Timeframe::H1, h1_limit(limit))?;
        let h4 = self.bars(symbol, Timeframe::H4, h4_limit(limit))?;
        for (timeframe, bars) in [
            (Timeframe::M15, &base),
            (Timeframe::H1, &h1),
            (Timeframe::H4, &h4),
        ] {
            if bars.len() < MIN_BARS {
                return Err(ServiceError::InsufficientHistory {
                    timeframe,
                    got: bars.len(),
                    need: MIN_BARS,
                });
            }
        }
        Ok((base, h1, h4))
    }

    /// Threshold base for the live signal: the cached optimizer suggestion,
    /// or the configured default. Staleness is acceptable here — the cache
    /// stabilizes the live threshold, it is not a correctness input.
    fn suggested_threshold(&self, symbol: &str) -> f64 {
        self.optimizer_cache
            .get(&symbol.to_string(), self.now())
            .map(|c| c.threshold)
            .unwrap_or(self.config.default_threshold)
    }

    /// Compute the live signal for a symbol.
    ///
    /// On a data failure, falls back to the last good signal for the symbol
    /// (however old) as a `Degraded` outcome; without one, the data error
    /// propagates.
    pub fn compute_signal(&self, symbol: &str) -> Result<SignalOutcome, ServiceError> {
        match self.compute_signal_fresh(symbol) {
            Ok(report) => {
                self.signal_cache
                    .put(symbol.to_string(), report.clone(), self.now());
                Ok(SignalOutcome::Fresh(report))
            }
            Err(err @ (ServiceError::DataUnavailable(_) | ServiceError::InsufficientHistory { .. })) => {
                match self.signal_cache.get_stale(&symbol.to_string()) {
                    Some(report) => Ok(SignalOutcome::Degraded {
                        report,
                        reason: err.to_string(),
                    }),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    fn compute_signal_fresh(&self, symbol: &str) -> Result<SignalReport, ServiceError> {
        let (base, h1, h4) = self.timeframe_bars(symbol, self.config.signal_limit)?;

        let enriched_base = enrich(&base);
        let enriched_h1 = enrich(&h1);
        let enriched_h4 = enrich(&h4);
        // timeframe_bars guarantees non-empty series
        let b = enriched_base.last().expect("non-empty base series");
        let b1 = enriched_h1.last().expect("non-empty h1 series");
        let b4 = enriched_h4.last().expect("non-empty h4 series");

        let votes = MtfVotes {
            base: directional_vote(b).total(),
            h1: directional_vote(b1).total(),
            h4: directional_vote(b4).total(),
        };
        let filters = regime_filters(b);
        let (mut side, score) = decide_side(&votes, &filters);

        let threshold = dynamic_threshold(
            self.suggested_threshold(symbol),
            side,
            filters.adx_ok,
            b.adx,
            b.atr_pct,
        );
        if side != Side::Hold && score < threshold {
            side = Side::Hold;
        }

        let levels = adaptive_sl_tp(b.close, b.atr, side, b.adx, b.atr_pct);

        Ok(SignalReport {
            symbol: symbol.to_string(),
            side,
            score,
            threshold,
            price: Some(b.close),
            rsi: b.rsi,
            atr: b.atr,
            ema_fast: b.ema_fast,
            ema_slow: b.ema_slow,
            atr_pct: b.atr_pct,
            adx: b.adx,
            stop_loss: levels.map(|(sl, _)| sl),
            take_profit: levels.map(|(_, tp)| tp),
            votes,
            filters,
            as_of: self.now(),
        })
    }

    /// Run one backtest over a fresh signal history.
    pub fn backtest(&self, symbol: &str, request: &BacktestRequest) -> Result<BacktestReport, ServiceError> {
        validate_threshold(request.threshold)?;
        validate_horizon(request.horizon)?;
        validate_limit(request.limit)?;
        validate_costs(request.commission_bps, request.slippage_bps, request.position_size)?;

        let (base, h1, h4) = self.timeframe_bars(symbol, request.limit)?;
        let rows = build_signal_history(&base, &h1, &h4);
        let params = request.params();
        let trades = simulate(&rows, &base, &params);

        let mut report = BacktestReport::compute(symbol, &params, request.limit, &trades);
        if let Some(samples) = request.bootstrap_samples {
            let config = BootstrapConfig { samples, ..BootstrapConfig::default() };
            report.bootstrap = Some(bootstrap_interval(&trades, &config));
        }
        Ok(report)
    }

    /// Run the full threshold × horizon grid; one report per cell.
    pub fn sweep(&self, symbol: &str, request: &SweepRequest) -> Result<Vec<BacktestReport>, ServiceError> {
        if request.thresholds.is_empty() || request.horizons.is_empty() {
            return Err(ServiceError::Validation(
                "thresholds and horizons must be non-empty".into(),
            ));
        }
        for &t in &request.thresholds {
            validate_threshold(t)?;
        }
        for &h in &request.horizons {
            validate_horizon(h)?;
        }
        validate_limit(request.limit)?;
        validate_costs(request.commission_bps, request.slippage_bps, request.position_size)?;

        let (base, h1, h4) = self.timeframe_bars(symbol, request.limit)?;
        let rows = build_signal_history(&base, &h1, &h4);
        let base_params = BacktestParams {
            commission_bps: request.commission_bps,
            slippage_bps: request.slippage_bps,
            position_size: request.position_size,
            mode: request.mode,
            tie_break: request.tie_break,
            ..BacktestParams::default()
        };
        Ok(sweep_grid(
            symbol,
            &rows,
            &base,
            &base_params,
            request.limit,
            &request.thresholds,
            &request.horizons,
        ))
    }

    /// Run the optimizer and cache its suggestion for the live threshold.
    ///
    /// A fresh cached candidate short-circuits the grid search.
    pub fn optimize(
        &self,
        symbol: &str,
        limit: usize,
        request: &OptimizeRequest,
    ) -> Result<OptimizerCandidate, ServiceError> {
        for &t in &request.thresholds {
            validate_threshold(t)?;
        }
        for &h in &request.horizons {
            validate_horizon(h)?;
        }
        validate_limit(limit)?;
        validate_target_hit(request.target_hit)?;
        if request.walkforward && request.folds < 2 {
            return Err(ServiceError::Validation(format!(
                "walk-forward needs at least 2 folds, got {}",
                request.folds
            )));
        }

        if let Some(cached) = self.optimizer_cache.get(&symbol.to_string(), self.now()) {
            return Ok(cached);
        }

        let (base, h1, h4) = self.timeframe_bars(symbol, limit)?;
        let rows = build_signal_history(&base, &h1, &h4);
        let candidate = optimize_grid(&rows, &base, &BacktestParams::default(), request);
        self.optimizer_cache
            .put(symbol.to_string(), candidate, self.now());
        Ok(candidate)
    }
}

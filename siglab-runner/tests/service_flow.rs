//! End-to-end service tests over a mock data provider and a controllable
//! clock: live signal with caching and degradation, backtest, sweep, and
//! optimizer caching.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use siglab_core::data::{BarProvider, Clock, DataError};
use siglab_core::domain::{Bar, Side, Timeframe};
use siglab_runner::config::ServiceConfig;
use siglab_runner::optimizer::OptimizeRequest;
use siglab_runner::service::{BacktestRequest, ServiceError, SignalOutcome, SignalService, SweepRequest};

// ─── Fixtures ────────────────────────────────────────────────────────

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Steadily rising 15-minute bars, +0.3% per bar with a modest range.
fn rising_base(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 100.0 * 1.003f64.powi(i as i32);
            let open = if i == 0 { 100.0 } else { 100.0 * 1.003f64.powi(i as i32 - 1) };
            Bar {
                ts: origin() + Duration::minutes(15 * i as i64),
                open,
                high: close * 1.001,
                low: open * 0.999,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

fn resample(base: &[Bar], step: usize) -> Vec<Bar> {
    base.chunks(step)
        .map(|chunk| Bar {
            ts: chunk.last().unwrap().ts,
            open: chunk[0].open,
            high: chunk.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
            low: chunk.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
            close: chunk.last().unwrap().close,
            volume: chunk.iter().map(|b| b.volume).sum(),
        })
        .collect()
}

struct MockInner {
    base: Vec<Bar>,
    h1: Vec<Bar>,
    h4: Vec<Bar>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

#[derive(Clone)]
struct MockProvider(Arc<MockInner>);

impl MockProvider {
    fn rising(n: usize) -> Self {
        let base = rising_base(n);
        let h1 = resample(&base, 4);
        let h4 = resample(&base, 16);
        Self(Arc::new(MockInner {
            base,
            h1,
            h4,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }))
    }

    fn calls(&self) -> usize {
        self.0.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.0.failing.store(failing, Ordering::SeqCst);
    }
}

impl BarProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch_bars(&self, _symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Bar>, DataError> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        if self.0.failing.load(Ordering::SeqCst) {
            return Err(DataError::AllSourcesFailed("mock outage".into()));
        }
        let series = match timeframe {
            Timeframe::M15 => &self.0.base,
            Timeframe::H1 => &self.0.h1,
            Timeframe::H4 => &self.0.h4,
        };
        let start = series.len().saturating_sub(limit);
        Ok(series[start..].to_vec())
    }
}

#[derive(Clone)]
struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
    fn at(t: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(t)))
    }

    fn advance(&self, d: Duration) {
        *self.0.lock().unwrap() += d;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn service(provider: MockProvider, clock: TestClock) -> SignalService<MockProvider, TestClock> {
    SignalService::new(provider, clock, ServiceConfig::default())
}

// ─── Live signal ─────────────────────────────────────────────────────

#[test]
fn fresh_signal_end_to_end() {
    let provider = MockProvider::rising(1600);
    let clock = TestClock::at(origin() + Duration::days(30));
    let svc = service(provider, clock.clone());

    let outcome = svc.compute_signal("BTCUSDT").unwrap();
    let report = match outcome {
        SignalOutcome::Fresh(report) => report,
        SignalOutcome::Degraded { .. } => panic!("expected a fresh signal"),
    };
    assert_eq!(report.symbol, "BTCUSDT");
    assert_eq!(report.as_of, clock.now());
    assert!((0.0..=1.0).contains(&report.score));
    assert!(report.threshold > 0.0);
    assert!(report.price.unwrap() > 0.0);
    // A steady uptrend never reads as a short
    assert_ne!(report.side, Side::Sell);
    if report.side == Side::Buy {
        let (sl, tp) = (report.stop_loss.unwrap(), report.take_profit.unwrap());
        assert!(sl < report.price.unwrap());
        assert!(tp > report.price.unwrap());
    }
}

#[test]
fn cached_signal_skips_the_provider() {
    let provider = MockProvider::rising(1600);
    let clock = TestClock::at(origin() + Duration::days(30));
    let svc = service(provider.clone(), clock.clone());

    let first = svc.compute_signal("BTCUSDT").unwrap();
    let calls_after_first = provider.calls();
    clock.advance(Duration::seconds(30)); // inside both TTLs

    let second = svc.compute_signal("BTCUSDT").unwrap();
    assert_eq!(provider.calls(), calls_after_first);
    assert_eq!(first.report(), second.report());
}

#[test]
fn outage_degrades_to_the_last_good_signal() {
    let provider = MockProvider::rising(1600);
    let clock = TestClock::at(origin() + Duration::days(30));
    let svc = service(provider.clone(), clock.clone());

    let fresh = svc.compute_signal("BTCUSDT").unwrap();
    clock.advance(Duration::hours(1)); // expire both caches
    provider.set_failing(true);

    match svc.compute_signal("BTCUSDT").unwrap() {
        SignalOutcome::Degraded { report, reason } => {
            assert_eq!(&report, fresh.report());
            assert!(reason.contains("mock outage"));
        }
        SignalOutcome::Fresh(_) => panic!("expected a degraded signal"),
    }
}

#[test]
fn outage_without_history_propagates() {
    let provider = MockProvider::rising(1600);
    provider.set_failing(true);
    let svc = service(provider, TestClock::at(origin()));

    match svc.compute_signal("BTCUSDT") {
        Err(ServiceError::DataUnavailable(_)) => {}
        other => panic!("expected DataUnavailable, got {other:?}"),
    }
}

#[test]
fn short_history_is_rejected() {
    let provider = MockProvider::rising(40); // below the 50-bar minimum
    let svc = service(provider, TestClock::at(origin() + Duration::days(30)));

    match svc.compute_signal("BTCUSDT") {
        Err(ServiceError::InsufficientHistory { got, need, .. }) => {
            assert!(got < need);
            assert_eq!(need, 50);
        }
        other => panic!("expected InsufficientHistory, got {other:?}"),
    }
}

// ─── Backtest / sweep / optimize ─────────────────────────────────────

#[test]
fn backtest_end_to_end_on_an_uptrend() {
    let provider = MockProvider::rising(1600);
    let svc = service(provider, TestClock::at(origin() + Duration::days(30)));

    let request = BacktestRequest { limit: 400, ..BacktestRequest::default() };
    let report = svc.backtest("BTCUSDT", &request).unwrap();

    assert_eq!(report.symbol, "BTCUSDT");
    assert!(report.trades > 0, "an uptrend should produce trades");
    assert!(report.net_return_sum > 0.0);
    assert!(report.hit_rate > 0.5);
    assert_eq!(report.equity_curve.len(), report.trades);
    assert!(report.bootstrap.is_none());
    assert_eq!(report.run_id.len(), 64);
}

#[test]
fn backtest_attaches_bootstrap_on_request() {
    let provider = MockProvider::rising(1600);
    let svc = service(provider, TestClock::at(origin() + Duration::days(30)));

    let request = BacktestRequest {
        limit: 400,
        bootstrap_samples: Some(200),
        ..BacktestRequest::default()
    };
    let report = svc.backtest("BTCUSDT", &request).unwrap();
    let interval = report.bootstrap.expect("bootstrap interval requested");
    assert_eq!(interval.samples, 200);
    assert!(interval.hit_rate_low <= report.hit_rate);
    assert!(report.hit_rate <= interval.hit_rate_high);
}

#[test]
fn backtest_rejects_bad_parameters() {
    let provider = MockProvider::rising(1600);
    let svc = service(provider.clone(), TestClock::at(origin() + Duration::days(30)));

    let bad_threshold = BacktestRequest { threshold: 1.0, ..BacktestRequest::default() };
    assert!(matches!(
        svc.backtest("BTCUSDT", &bad_threshold),
        Err(ServiceError::Validation(_))
    ));
    let bad_horizon = BacktestRequest { horizon: 51, ..BacktestRequest::default() };
    assert!(matches!(
        svc.backtest("BTCUSDT", &bad_horizon),
        Err(ServiceError::Validation(_))
    ));
    // Validation fires before any fetch
    assert_eq!(provider.calls(), 0);
}

#[test]
fn sweep_covers_the_whole_grid() {
    let provider = MockProvider::rising(1600);
    let svc = service(provider, TestClock::at(origin() + Duration::days(30)));

    let request = SweepRequest {
        thresholds: vec![0.5, 0.7],
        horizons: vec![2, 4],
        limit: 400,
        ..SweepRequest::default()
    };
    let reports = svc.sweep("BTCUSDT", &request).unwrap();
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0].threshold, 0.5);
    assert_eq!(reports[0].horizon, 2);
    assert_eq!(reports[3].threshold, 0.7);
    assert_eq!(reports[3].horizon, 4);
    // A lower threshold can only admit more trades
    assert!(reports[0].trades >= reports[2].trades);
}

#[test]
fn optimizer_result_is_cached_per_symbol() {
    let provider = MockProvider::rising(1600);
    let svc = service(provider.clone(), TestClock::at(origin() + Duration::days(30)));

    let request = OptimizeRequest::default();
    let first = svc.optimize("BTCUSDT", 400, &request).unwrap();
    let calls_after_first = provider.calls();
    let second = svc.optimize("BTCUSDT", 400, &request).unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.calls(), calls_after_first);
    assert!(request.thresholds.contains(&first.threshold));
    assert!(request.horizons.contains(&first.horizon));
}

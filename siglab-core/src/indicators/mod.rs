//! Indicator pipeline — pure functions from bar sequences to derived series.
//!
//! Each indicator lives in its own file and computes independently of the
//! others; `enrich` composes them into one `EnrichedBar` per input bar.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod choppiness;
pub mod donchian;
pub mod ema;
pub mod enrich;
pub mod keltner;
pub mod macd;
pub mod rsi;
pub mod stoch_rsi;
pub mod volume_flow;
pub mod vwap;

pub use enrich::{enrich, EnrichedBar};

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{Duration, TimeZone, Utc};

    use crate::domain::Bar;

    /// Bar `i` steps of 15 minutes after a fixed origin, volume 1000.
    pub(crate) fn bar_at(i: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            ts: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(15 * i),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    pub(crate) fn bar_with_volume(
        i: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Bar {
        let mut bar = bar_at(i, open, high, low, close);
        bar.volume = volume;
        bar
    }

    /// Monotonically rising series with strong trend characteristics:
    /// +0.3% per bar, modest intra-bar range, each close a fresh high.
    pub(crate) fn rising_series(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 100.0 * 1.003f64.powi(i as i32);
                let prev_close = if i == 0 { 100.0 } else { 100.0 * 1.003f64.powi(i as i32 - 1) };
                bar_at(i as i64, prev_close, close * 1.001, prev_close * 0.999, close)
            })
            .collect()
    }
}

//! Signal history: the full pipeline over three timeframes, aligned to the
//! base timeframe.
//!
//! Higher-timeframe bars are forward-filled onto the base index: each base
//! bar sees the most recent 1h and 4h bar at or before its own timestamp.
//! Base bars older than the first higher-timeframe bar have no context and
//! vote 0 on that timeframe.

use crate::domain::{Bar, MtfVotes, SignalRow};
use crate::indicators::{enrich, EnrichedBar};
use crate::signal::{decide_side, directional_vote, regime_filters};

/// Minimum aligned bars each timeframe must supply for a usable signal.
pub const MIN_BARS: usize = 50;

/// Index of the most recent element of `series` at or before each timestamp
/// in `index`, forward-filled. `None` until the first element is reached.
/// Both inputs must be sorted ascending by timestamp.
fn ffill_align(index: &[Bar], series: &[EnrichedBar]) -> Vec<Option<usize>> {
    let mut out = Vec::with_capacity(index.len());
    let mut j = 0usize;
    let mut current: Option<usize> = None;
    for bar in index {
        while j < series.len() && series[j].ts <= bar.ts {
            current = Some(j);
            j += 1;
        }
        out.push(current);
    }
    out
}

/// Build one `SignalRow` per base bar from the three timeframe series.
pub fn build_signal_history(base: &[Bar], h1: &[Bar], h4: &[Bar]) -> Vec<SignalRow> {
    let enriched = enrich(base);
    let enriched_h1 = enrich(h1);
    let enriched_h4 = enrich(h4);

    let idx_h1 = ffill_align(base, &enriched_h1);
    let idx_h4 = ffill_align(base, &enriched_h4);

    enriched
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let v_h1 = idx_h1[i]
                .map(|j| directional_vote(&enriched_h1[j]).total())
                .unwrap_or(0.0);
            let v_h4 = idx_h4[i]
                .map(|j| directional_vote(&enriched_h4[j]).total())
                .unwrap_or(0.0);
            let votes = MtfVotes {
                base: directional_vote(bar).total(),
                h1: v_h1,
                h4: v_h4,
            };
            let flags = regime_filters(bar);
            let (side, score) = decide_side(&votes, &flags);

            SignalRow {
                ts: bar.ts,
                close: bar.close,
                atr: bar.atr,
                rsi: bar.rsi,
                ema_fast: bar.ema_fast,
                ema_slow: bar.ema_slow,
                atr_pct: bar.atr_pct,
                adx: bar.adx,
                side,
                score,
            }
        })
        .collect()
}

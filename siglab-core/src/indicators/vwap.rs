//! Whole-window VWAP: a running fair-value estimate since window start.
//!
//! Deliberately cumulative rather than rolling — the deviation measure is
//! anchored to the start of the requested history, matching the session-style
//! fair-value reading the vote model expects.

use crate::domain::Bar;

/// Cumulative typical-price VWAP. Undefined while cumulative volume is zero.
pub fn vwap(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(bars.len());
    let mut pv = 0.0;
    let mut vol = 0.0;
    for bar in bars {
        pv += bar.typical_price() * bar.volume;
        vol += bar.volume;
        out.push(if vol > 0.0 { Some(pv / vol) } else { None });
    }
    out
}

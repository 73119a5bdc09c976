//! Keltner Channel: EMA(20) center with ATR-multiple bands (non-original variant).

use crate::domain::Bar;

use super::atr::atr;
use super::ema::ema;

/// Keltner upper/lower bands: EMA(`window`) of close ± `multiplier` · ATR(`atr_window`).
pub fn keltner(
    bars: &[Bar],
    window: usize,
    atr_window: usize,
    multiplier: f64,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let center = ema(&close, window);
    let atr_series = atr(bars, atr_window);

    let mut high = vec![None; bars.len()];
    let mut low = vec![None; bars.len()];
    for i in 0..bars.len() {
        if let (Some(c), Some(a)) = (center[i], atr_series[i]) {
            high[i] = Some(c + multiplier * a);
            low[i] = Some(c - multiplier * a);
        }
    }
    (high, low)
}

/// Squeeze detection: Bollinger fully inside Keltner.
///
/// Defaults to `false` whenever any band is undefined — a failed channel
/// computation must never block signal generation.
pub fn squeeze_on(
    bb_high: &[Option<f64>],
    bb_low: &[Option<f64>],
    kc_high: &[Option<f64>],
    kc_low: &[Option<f64>],
) -> Vec<bool> {
    bb_high
        .iter()
        .zip(bb_low)
        .zip(kc_high.iter().zip(kc_low))
        .map(|((bh, bl), (kh, kl))| match (bh, bl, kh, kl) {
            (Some(bh), Some(bl), Some(kh), Some(kl)) => bh < kh && bl > kl,
            _ => false,
        })
        .collect()
}

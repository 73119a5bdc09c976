//! True range and Average True Range via Wilder smoothing.

use crate::domain::Bar;

/// True range per bar: max(high-low, |high-prev_close|, |low-prev_close|).
/// The first bar has no previous close, so its TR is plain high-low.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                let prev_close = bars[i - 1].close;
                (bar.high - bar.low)
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs())
            }
        })
        .collect()
}

/// ATR over `window` bars: SMA seed over the first `window` true ranges,
/// then Wilder smoothing.
pub fn atr(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let tr = true_range(bars);
    let n = tr.len();
    let mut out = vec![None; n];
    if window == 0 || n < window {
        return out;
    }
    let w = window as f64;
    let mut prev = tr[..window].iter().sum::<f64>() / w;
    out[window - 1] = Some(prev);
    for i in window..n {
        prev = (prev * (w - 1.0) + tr[i]) / w;
        out[i] = Some(prev);
    }
    out
}

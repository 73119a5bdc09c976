//! Donchian Channel: rolling highest-high / lowest-low envelope and breakouts.

use crate::domain::Bar;

/// Donchian upper/lower/middle bands over `window` bars (current bar included).
pub fn donchian(
    bars: &[Bar],
    window: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let n = bars.len();
    let mut high = vec![None; n];
    let mut low = vec![None; n];
    let mut mid = vec![None; n];
    if window == 0 || n < window {
        return (high, low, mid);
    }

    for i in (window - 1)..n {
        let slice = &bars[i + 1 - window..=i];
        let h = slice.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let l = slice.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        high[i] = Some(h);
        low[i] = Some(l);
        mid[i] = Some((h + l) / 2.0);
    }
    (high, low, mid)
}

/// Breakout flags: close beyond the *prior* band.
pub fn breakouts(
    bars: &[Bar],
    high: &[Option<f64>],
    low: &[Option<f64>],
) -> (Vec<bool>, Vec<bool>) {
    let n = bars.len();
    let mut up = vec![false; n];
    let mut down = vec![false; n];
    for i in 1..n {
        if let Some(prev_high) = high[i - 1] {
            up[i] = bars[i].close > prev_high;
        }
        if let Some(prev_low) = low[i - 1] {
            down[i] = bars[i].close < prev_low;
        }
    }
    (up, down)
}

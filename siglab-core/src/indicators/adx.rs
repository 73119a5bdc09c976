//! Average Directional Index from smoothed directional movement and true range.

use crate::domain::Bar;

use super::atr::true_range;

/// ADX over `window` bars.
///
/// Wilder sum-smoothing of +DM/-DM/TR gives the directional indicators; DX is
/// their normalized spread; ADX is the Wilder-smoothed DX. First defined value
/// lands at index `2*window - 1`. Bars where both directional sums vanish
/// yield DX = 0 rather than propagating a division by zero.
pub fn adx(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    let mut out = vec![None; n];
    if window == 0 || n < 2 * window {
        return out;
    }

    let tr = true_range(bars);
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    // Wilder-smoothed running sums, seeded over bars 1..=window
    let w = window as f64;
    let mut sm_tr: f64 = tr[1..=window].iter().sum();
    let mut sm_plus: f64 = plus_dm[1..=window].iter().sum();
    let mut sm_minus: f64 = minus_dm[1..=window].iter().sum();

    let mut dx = vec![None; n];
    dx[window] = Some(dx_value(sm_plus, sm_minus, sm_tr));
    for i in (window + 1)..n {
        sm_tr = sm_tr - sm_tr / w + tr[i];
        sm_plus = sm_plus - sm_plus / w + plus_dm[i];
        sm_minus = sm_minus - sm_minus / w + minus_dm[i];
        dx[i] = Some(dx_value(sm_plus, sm_minus, sm_tr));
    }

    // ADX: SMA seed over the first `window` DX values, then Wilder smoothing
    let seed_end = 2 * window - 1;
    let mut prev = dx[window..=seed_end]
        .iter()
        .map(|v| v.unwrap_or(0.0))
        .sum::<f64>()
        / w;
    out[seed_end] = Some(prev);
    for i in (seed_end + 1)..n {
        prev = (prev * (w - 1.0) + dx[i].unwrap_or(0.0)) / w;
        out[i] = Some(prev);
    }
    out
}

fn dx_value(sm_plus: f64, sm_minus: f64, sm_tr: f64) -> f64 {
    if sm_tr <= 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * sm_plus / sm_tr;
    let minus_di = 100.0 * sm_minus / sm_tr;
    let total = plus_di + minus_di;
    if total <= 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / total
    }
}

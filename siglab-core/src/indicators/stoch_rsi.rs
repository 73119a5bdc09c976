//! Stochastic RSI: RSI normalized to its own rolling range, with %K/%D smoothing.

/// StochRSI over `window` RSI values, plus SMA(`smooth_k`) %K and
/// SMA(`smooth_d`) %D lines. All three are in [0, 1].
///
/// Undefined while the RSI window is incomplete or the RSI range is zero.
pub fn stoch_rsi(
    rsi: &[Option<f64>],
    window: usize,
    smooth_k: usize,
    smooth_d: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let n = rsi.len();
    let mut stoch = vec![None; n];
    if window == 0 {
        return (stoch.clone(), stoch.clone(), stoch);
    }

    for i in 0..n {
        if i + 1 < window {
            continue;
        }
        let slice = &rsi[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_none()) {
            continue;
        }
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in slice.iter().flatten() {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
        let range = hi - lo;
        if range > 0.0 {
            if let Some(cur) = rsi[i] {
                stoch[i] = Some((cur - lo) / range);
            }
        }
    }

    let k = rolling_mean(&stoch, smooth_k);
    let d = rolling_mean(&k, smooth_d);
    (stoch, k, d)
}

/// Rolling mean over a possibly-undefined series; undefined unless the whole
/// window is defined.
fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if window == 0 {
        return out;
    }
    for i in 0..n {
        if i + 1 < window {
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        if slice.iter().all(|v| v.is_some()) {
            let sum: f64 = slice.iter().flatten().sum();
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::rsi::rsi;

    #[test]
    fn stoch_rsi_bounded_zero_one() {
        let close: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.45).sin() * 4.0)
            .collect();
        let r = rsi(&close, 14);
        let (s, k, d) = stoch_rsi(&r, 14, 3, 3);
        for v in s.iter().chain(&k).chain(&d).flatten() {
            assert!((0.0..=1.0).contains(v), "out of range: {v}");
        }
    }

    #[test]
    fn stoch_rsi_undefined_on_zero_range() {
        // RSI pinned at 100 for a rising series: range is zero
        let close: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let r = rsi(&close, 14);
        let (s, _, _) = stoch_rsi(&r, 14, 3, 3);
        assert!(s.last().unwrap().is_none());
    }

    #[test]
    fn stoch_rsi_hits_extremes() {
        // Strong down move then strong up move: stoch should reach ~1 at the top
        let mut close: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        close.extend((0..60).map(|i| 140.0 + i as f64));
        let r = rsi(&close, 14);
        let (s, _, _) = stoch_rsi(&r, 14, 3, 3);
        let last = s.last().unwrap().unwrap();
        assert!(last > 0.95, "expected near 1, got {last}");
    }

    #[test]
    fn rolling_mean_requires_full_window() {
        let values = vec![None, Some(1.0), Some(2.0), Some(3.0)];
        let out = rolling_mean(&values, 2);
        assert_eq!(out[1], None); // window touches the leading None
        assert!((out[2].unwrap() - 1.5).abs() < 1e-12);
        assert!((out[3].unwrap() - 2.5).abs() < 1e-12);
    }
}

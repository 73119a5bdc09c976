//! Choppiness Index: range-bound vs trending behavior.

use crate::domain::Bar;

use super::atr::true_range;

/// Choppiness Index over `window` bars:
/// 100 · log10(Σ TR / (max(high) − min(low))) / log10(window).
///
/// High values mean range-bound churn; low values mean directional movement.
/// Undefined when the window range or true-range sum is zero.
pub fn choppiness(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    let mut out = vec![None; n];
    if window < 2 || n < window {
        return out;
    }

    let tr = true_range(bars);
    let log_window = (window as f64).log10();

    for i in (window - 1)..n {
        let slice = i + 1 - window..=i;
        let tr_sum: f64 = tr[slice.clone()].iter().sum();
        let hh = bars[slice.clone()]
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let ll = bars[slice].iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let range = hh - ll;
        if range > 0.0 && tr_sum > 0.0 {
            out[i] = Some(100.0 * (tr_sum / range).log10() / log_window);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::testutil::bar_at;

    #[test]
    fn choppiness_low_in_trend() {
        let bars: Vec<Bar> = (0..40)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                bar_at(i, base, base + 1.0, base - 1.0, base + 0.8)
            })
            .collect();
        let v = choppiness(&bars, 14).last().unwrap().unwrap();
        assert!(v < 61.0, "trending series should not be choppy, got {v}");
    }

    #[test]
    fn choppiness_high_in_range() {
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let base = 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 };
                bar_at(i, base, base + 1.0, base - 1.0, base)
            })
            .collect();
        let v = choppiness(&bars, 14).last().unwrap().unwrap();
        assert!(v > 61.0, "oscillating series should be choppy, got {v}");
    }

    #[test]
    fn choppiness_undefined_on_flat_bars() {
        let bars: Vec<Bar> = (0..30)
            .map(|i| bar_at(i, 100.0, 100.0, 100.0, 100.0))
            .collect();
        assert!(choppiness(&bars, 14).iter().all(|v| v.is_none()));
    }
}

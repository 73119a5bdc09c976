//! Volume-flow indicators: MFI, OBV (and its slope), CMF.

use crate::domain::Bar;

/// Money Flow Index over `window` bars.
///
/// 100 · positive_flow / (positive_flow + negative_flow); undefined when the
/// window has no money flow at all.
pub fn mfi(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    let mut out = vec![None; n];
    if window == 0 || n <= window {
        return out;
    }

    // Signed raw money flow per bar (index 0 has no prior typical price)
    let mut flow = vec![0.0f64; n];
    for i in 1..n {
        let tp = bars[i].typical_price();
        let prev_tp = bars[i - 1].typical_price();
        let raw = tp * bars[i].volume;
        if tp > prev_tp {
            flow[i] = raw;
        } else if tp < prev_tp {
            flow[i] = -raw;
        }
    }

    for i in window..n {
        let slice = &flow[i + 1 - window..=i];
        let pos: f64 = slice.iter().filter(|v| **v > 0.0).sum();
        let neg: f64 = -slice.iter().filter(|v| **v < 0.0).sum::<f64>();
        let total = pos + neg;
        if total > 0.0 {
            out[i] = Some(100.0 * pos / total);
        }
    }
    out
}

/// On-Balance Volume: cumulative volume signed by the close-to-close move.
pub fn obv(bars: &[Bar]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bars.len());
    let mut acc = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            acc = bar.volume;
        } else if bar.close > bars[i - 1].close {
            acc += bar.volume;
        } else if bar.close < bars[i - 1].close {
            acc -= bar.volume;
        }
        out.push(acc);
    }
    out
}

/// OBV slope: OBV minus OBV shifted `lag` bars.
pub fn obv_slope(obv: &[f64], lag: usize) -> Vec<Option<f64>> {
    let n = obv.len();
    let mut out = vec![None; n];
    for i in lag..n {
        out[i] = Some(obv[i] - obv[i - lag]);
    }
    out
}

/// Chaikin Money Flow over `window` bars.
///
/// Money flow multiplier is 0 for bars with no range (high == low).
pub fn cmf(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    let mut out = vec![None; n];
    if window == 0 || n < window {
        return out;
    }

    let mfv: Vec<f64> = bars
        .iter()
        .map(|b| {
            let range = b.high - b.low;
            if range > 0.0 {
                ((b.close - b.low) - (b.high - b.close)) / range * b.volume
            } else {
                0.0
            }
        })
        .collect();

    for i in (window - 1)..n {
        let slice = i + 1 - window..=i;
        let vol_sum: f64 = bars[slice.clone()].iter().map(|b| b.volume).sum();
        if vol_sum > 0.0 {
            let mfv_sum: f64 = mfv[slice].iter().sum();
            out[i] = Some(mfv_sum / vol_sum);
        }
    }
    out
}

//! Relative Strength Index via Wilder smoothing.

/// RSI over `window` bars. Undefined until `window` price changes exist,
/// and undefined on a perfectly flat window (0/0 relative strength).
pub fn rsi(close: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = close.len();
    let mut out = vec![None; n];
    if window == 0 || n <= window {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=window {
        let diff = close[i] - close[i - 1];
        if diff > 0.0 {
            avg_gain += diff;
        } else {
            avg_loss += -diff;
        }
    }
    avg_gain /= window as f64;
    avg_loss /= window as f64;
    out[window] = rsi_value(avg_gain, avg_loss);

    let w = window as f64;
    for i in (window + 1)..n {
        let diff = close[i] - close[i - 1];
        let gain = if diff > 0.0 { diff } else { 0.0 };
        let loss = if diff < 0.0 { -diff } else { 0.0 };
        avg_gain = (avg_gain * (w - 1.0) + gain) / w;
        avg_loss = (avg_loss * (w - 1.0) + loss) / w;
        out[i] = rsi_value(avg_gain, avg_loss);
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss > 0.0 {
        Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
    } else if avg_gain > 0.0 {
        Some(100.0)
    } else {
        // Flat window: relative strength is 0/0
        None
    }
}

//! Exponential moving average and first-difference slope.

/// EMA over a fully-defined series.
///
/// Seeded with the SMA of the first `window` values; the first `window - 1`
/// outputs are undefined.
pub fn ema(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if window == 0 || n < window {
        return out;
    }
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut prev = values[..window].iter().sum::<f64>() / window as f64;
    out[window - 1] = Some(prev);
    for i in window..n {
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        out[i] = Some(prev);
    }
    out
}

/// EMA over a series with an undefined warmup prefix (e.g. the MACD line).
///
/// The leading `None` run is skipped and the EMA is seeded inside the
/// defined suffix. Interior gaps are not expected on any series we produce.
pub fn ema_partial(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    let Some(start) = values.iter().position(|v| v.is_some()) else {
        return out;
    };
    let defined: Vec<f64> = values[start..].iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    for (i, v) in ema(&defined, window).into_iter().enumerate() {
        out[start + i] = v.filter(|x| x.is_finite());
    }
    out
}

/// First difference of a possibly-undefined series: `v[i] - v[i-1]`.
pub fn slope(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    for i in 1..n {
        if let (Some(cur), Some(prev)) = (values[i], values[i - 1]) {
            out[i] = Some(cur - prev);
        }
    }
    out
}

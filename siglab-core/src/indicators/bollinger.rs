//! Bollinger Bands: SMA(20) ± 2 standard deviations.

/// Bollinger upper/lower/middle bands.
///
/// Population standard deviation over the window. A zero midline is treated
/// as undefined so downstream width/position math never divides by zero.
pub fn bollinger(
    close: &[f64],
    window: usize,
    dev: f64,
) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let n = close.len();
    let mut high = vec![None; n];
    let mut low = vec![None; n];
    let mut mid = vec![None; n];
    if window == 0 || n < window {
        return (high, low, mid);
    }

    for i in (window - 1)..n {
        let slice = &close[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;
        let sd = var.sqrt();
        high[i] = Some(mean + dev * sd);
        low[i] = Some(mean - dev * sd);
        mid[i] = if mean == 0.0 { None } else { Some(mean) };
    }
    (high, low, mid)
}

/// Relative band width: (high - low) / mid. Non-finite results are undefined.
pub fn bb_width(
    high: &[Option<f64>],
    low: &[Option<f64>],
    mid: &[Option<f64>],
) -> Vec<Option<f64>> {
    high.iter()
        .zip(low)
        .zip(mid)
        .map(|((h, l), m)| match (h, l, m) {
            (Some(h), Some(l), Some(m)) => {
                let w = (h - l) / m;
                w.is_finite().then_some(w)
            }
            _ => None,
        })
        .collect()
}

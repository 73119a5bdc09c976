//! MACD: EMA(12) - EMA(26), its EMA(9) signal line, and the histogram.

use super::ema::{ema, ema_partial};

/// MACD line, signal line, and histogram, index-aligned with the input.
pub fn macd(
    close: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let fast_ema = ema(close, fast);
    let slow_ema = ema(close, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal_line = ema_partial(&line, signal);

    let hist: Vec<Option<f64>> = line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    (line, signal_line, hist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_warmup_lengths() {
        let close: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let (line, signal, hist) = macd(&close, 12, 26, 9);
        assert_eq!(line.len(), 60);
        // Line defined from the slow EMA onward
        assert!(line[24].is_none());
        assert!(line[25].is_some());
        // Signal needs 9 defined MACD values
        assert!(signal[32].is_none());
        assert!(signal[33].is_some());
        assert!(hist[33].is_some());
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let close: Vec<f64> = (0..80).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let (line, _, hist) = macd(&close, 12, 26, 9);
        assert!(line.last().unwrap().unwrap() > 0.0);
        assert!(hist.last().unwrap().unwrap() >= 0.0);
    }

    #[test]
    fn macd_zero_on_flat_series() {
        let close = vec![100.0; 60];
        let (line, signal, hist) = macd(&close, 12, 26, 9);
        assert!((line.last().unwrap().unwrap()).abs() < 1e-12);
        assert!((signal.last().unwrap().unwrap()).abs() < 1e-12);
        assert!((hist.last().unwrap().unwrap()).abs() < 1e-12);
    }
}

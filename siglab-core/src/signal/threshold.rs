//! Dynamic score threshold for the live signal.

use crate::domain::Side;

/// Threshold used when no optimizer suggestion is cached.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Penalty for a quiet or directionless regime.
const QUIET_PENALTY: f64 = 0.05;
/// Discount inside a healthy trend with moderate volatility.
const TREND_DISCOUNT: f64 = 0.02;
/// Extra confidence demanded from shorts.
const SELL_PREMIUM: f64 = 0.02;

/// ATR% band considered a healthy trading range for the discount.
const ATR_PCT_QUIET: f64 = 0.0015;
const ATR_PCT_CALM_MAX: f64 = 0.02;
/// ADX level treated as a confirmed trend.
const ADX_TREND: f64 = 20.0;

/// Compute the score threshold a live signal must clear, starting from the
/// cached optimizer suggestion (or the default when none exists).
///
/// Quiet or trendless regimes raise the bar; a confirmed trend with moderate
/// volatility lowers it slightly; SELL always pays a small premium.
pub fn dynamic_threshold(
    base: f64,
    side: Side,
    adx_ok: bool,
    adx: Option<f64>,
    atr_pct: Option<f64>,
) -> f64 {
    let mut threshold = base;

    let quiet = atr_pct.map(|p| p < ATR_PCT_QUIET).unwrap_or(true);
    if !adx_ok || quiet {
        threshold += QUIET_PENALTY;
    }

    let trending = adx.map(|a| a >= ADX_TREND).unwrap_or(false);
    let calm = atr_pct
        .map(|p| (ATR_PCT_QUIET..=ATR_PCT_CALM_MAX).contains(&p))
        .unwrap_or(false);
    if trending && calm {
        threshold -= TREND_DISCOUNT;
    }

    if side == Side::Sell {
        threshold += SELL_PREMIUM;
    }

    threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_trend_discounts() {
        let t = dynamic_threshold(0.6, Side::Buy, true, Some(25.0), Some(0.01));
        assert!((t - 0.58).abs() < 1e-12);
    }

    #[test]
    fn quiet_market_raises_bar() {
        let t = dynamic_threshold(0.6, Side::Buy, true, Some(25.0), Some(0.001));
        assert!((t - 0.65).abs() < 1e-12);
    }

    #[test]
    fn trendless_regime_raises_bar() {
        let t = dynamic_threshold(0.6, Side::Buy, false, Some(10.0), Some(0.01));
        assert!((t - 0.65).abs() < 1e-12);
    }

    #[test]
    fn sell_pays_premium() {
        let buy = dynamic_threshold(0.6, Side::Buy, true, Some(25.0), Some(0.01));
        let sell = dynamic_threshold(0.6, Side::Sell, true, Some(25.0), Some(0.01));
        assert!((sell - buy - 0.02).abs() < 1e-12);
    }

    #[test]
    fn undefined_atr_pct_counts_as_quiet() {
        let t = dynamic_threshold(0.6, Side::Buy, true, Some(25.0), None);
        assert!((t - 0.65).abs() < 1e-12);
    }

    #[test]
    fn custom_base_is_respected() {
        let t = dynamic_threshold(0.55, Side::Buy, true, Some(25.0), Some(0.01));
        assert!((t - 0.53).abs() < 1e-12);
    }
}

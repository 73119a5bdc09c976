//! Regime filters: trend-strength and volatility gates.

use crate::domain::RegimeFlags;
use crate::indicators::EnrichedBar;

/// Minimum ADX for the trend gate.
pub const ADX_MIN: f64 = 12.0;
/// Acceptable ATR% window — below is too quiet, above is too wild.
pub const ATR_PCT_MIN: f64 = 0.0005;
pub const ATR_PCT_MAX: f64 = 0.04;
/// Minimum distance from the Bollinger midline, in ATR units.
pub const DIST_FROM_MID_MIN: f64 = 0.15;
/// Acceptable Bollinger width window.
pub const BB_WIDTH_MIN: f64 = 0.01;
pub const BB_WIDTH_MAX: f64 = 0.25;
/// Volume-flow veto: weak money flow with negative Chaikin flow.
pub const MFI_WEAK: f64 = 35.0;
/// Choppiness ceiling — above this the market is range-bound churn.
pub const CHOP_MAX: f64 = 61.0;

/// Evaluate the regime gates for one enriched bar.
///
/// `adx_ok` requires a defined ADX at or above the floor. `vol_ok` starts
/// from the ATR% window and is then vetoed by squeeze, midline hugging,
/// extreme band width, weak money flow, or choppiness. Undefined fields fail
/// the gate they feed (never pass-by-default), except the optional band-width
/// and choppiness vetoes which only fire on defined values.
pub fn regime_filters(bar: &EnrichedBar) -> RegimeFlags {
    let adx_ok = bar.adx.map(|v| v >= ADX_MIN).unwrap_or(false);

    let mut vol_ok = bar
        .atr_pct
        .map(|v| (ATR_PCT_MIN..=ATR_PCT_MAX).contains(&v))
        .unwrap_or(false);

    // No trading inside a Bollinger/Keltner squeeze; wait for expansion
    if bar.squeeze_on {
        vol_ok = false;
    }

    // Require distance from the mean to reduce whipsaws near the midline
    match bar.dist_from_mid_atr {
        Some(d) if d >= DIST_FROM_MID_MIN => {}
        _ => vol_ok = false,
    }

    // Sanity window on band width (extreme compression or expansion)
    if let Some(w) = bar.bb_width {
        if !(BB_WIDTH_MIN..=BB_WIDTH_MAX).contains(&w) {
            vol_ok = false;
        }
    }

    // Weak money flow with distribution pressure
    if let (Some(mfi), Some(cmf)) = (bar.mfi, bar.cmf) {
        if mfi < MFI_WEAK && cmf < 0.0 {
            vol_ok = false;
        }
    }

    // Range-bound churn
    if let Some(chop) = bar.choppiness {
        if chop > CHOP_MAX {
            vol_ok = false;
        }
    }

    RegimeFlags { adx_ok, vol_ok }
}

//! Adaptive ATR-based stop-loss and take-profit levels.

use crate::domain::Side;

/// Compute (stop_loss, take_profit) for an entry at `price` with the given
/// ATR context. Returns `None` for HOLD or when price/ATR are unusable.
///
/// The take-profit multiple widens to 2.5 ATR in a strong trend (ADX >= 20);
/// the stop tightens to 1.2 ATR when volatility is calm (ATR% <= 2%) and
/// widens to 1.5 ATR otherwise.
pub fn adaptive_sl_tp(
    price: f64,
    atr: Option<f64>,
    side: Side,
    adx: Option<f64>,
    atr_pct: Option<f64>,
) -> Option<(f64, f64)> {
    let atr = atr?;
    if !(price > 0.0 && atr > 0.0) {
        return None;
    }

    let tp_k = if adx.map(|a| a >= 20.0).unwrap_or(false) { 2.5 } else { 2.0 };
    let sl_k = if atr_pct.map(|p| p <= 0.02).unwrap_or(false) { 1.2 } else { 1.5 };

    match side {
        Side::Buy => Some((price - sl_k * atr, price + tp_k * atr)),
        Side::Sell => Some((price + sl_k * atr, price - tp_k * atr)),
        Side::Hold => None,
    }
}

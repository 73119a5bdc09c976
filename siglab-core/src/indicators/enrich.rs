//! The enrichment pass: bar sequence in, one `EnrichedBar` per input bar out.
//!
//! Every derived field is `None` until its window has enough history; that
//! undefined state propagates to downstream rejections rather than being
//! read as zero. Each indicator is computed independently — a field that
//! cannot be computed stays undefined (flags stay `false`) and never aborts
//! the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Bar;

use super::adx::adx;
use super::atr::atr;
use super::bollinger::{bb_width, bollinger};
use super::choppiness::choppiness;
use super::donchian::{breakouts, donchian};
use super::ema::{ema, slope};
use super::keltner::{keltner, squeeze_on};
use super::macd::macd;
use super::rsi::rsi;
use super::stoch_rsi::stoch_rsi;
use super::volume_flow::{cmf, mfi, obv, obv_slope};
use super::vwap::vwap;

// Window constants shared with the vote/regime model.
pub const EMA_FAST: usize = 12;
pub const EMA_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const RSI_WINDOW: usize = 14;
pub const ADX_WINDOW: usize = 14;
pub const ATR_WINDOW: usize = 14;
pub const BB_WINDOW: usize = 20;
pub const BB_DEV: f64 = 2.0;
pub const KC_WINDOW: usize = 20;
pub const KC_ATR_WINDOW: usize = 10;
pub const KC_MULTIPLIER: f64 = 2.0;
pub const MFI_WINDOW: usize = 14;
pub const CMF_WINDOW: usize = 20;
pub const OBV_SLOPE_LAG: usize = 5;
pub const STOCH_RSI_WINDOW: usize = 14;
pub const STOCH_RSI_SMOOTH: usize = 3;
pub const DONCHIAN_WINDOW: usize = 20;
pub const CHOP_WINDOW: usize = 14;

/// A bar plus every derived field the vote and regime models consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,

    // Trend
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub ema_fast_slope: Option<f64>,
    pub ema_slow_slope: Option<f64>,

    // Momentum
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi: Option<f64>,
    pub stoch_rsi: Option<f64>,
    pub stoch_rsi_k: Option<f64>,
    pub stoch_rsi_d: Option<f64>,
    pub adx: Option<f64>,

    // Volatility
    pub bb_high: Option<f64>,
    pub bb_low: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_width: Option<f64>,
    pub atr: Option<f64>,
    pub atr_pct: Option<f64>,
    pub kc_high: Option<f64>,
    pub kc_low: Option<f64>,
    pub squeeze_on: bool,
    pub dist_from_mid_atr: Option<f64>,
    pub donchian_high: Option<f64>,
    pub donchian_low: Option<f64>,
    pub donchian_mid: Option<f64>,
    pub donchian_break_up: bool,
    pub donchian_break_down: bool,
    pub choppiness: Option<f64>,

    // Volume flow
    pub mfi: Option<f64>,
    pub obv: f64,
    pub obv_slope: Option<f64>,
    pub cmf: Option<f64>,
    pub vwap: Option<f64>,
    pub vwap_dev_atr: Option<f64>,
    pub above_vwap: bool,
}

/// Run the full indicator pipeline over an ordered, deduplicated bar sequence.
///
/// Output is index-aligned with the input. Downstream consumers require at
/// least 50 bars for a usable signal; shorter input simply yields more
/// undefined leading values.
pub fn enrich(bars: &[Bar]) -> Vec<EnrichedBar> {
    let n = bars.len();
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let ema_fast = ema(&close, EMA_FAST);
    let ema_slow = ema(&close, EMA_SLOW);
    let ema_fast_slope = slope(&ema_fast);
    let ema_slow_slope = slope(&ema_slow);
    let (macd_line, macd_sig, macd_hist) = macd(&close, EMA_FAST, EMA_SLOW, MACD_SIGNAL);
    let rsi_series = rsi(&close, RSI_WINDOW);
    let (stoch, stoch_k, stoch_d) =
        stoch_rsi(&rsi_series, STOCH_RSI_WINDOW, STOCH_RSI_SMOOTH, STOCH_RSI_SMOOTH);
    let adx_series = adx(bars, ADX_WINDOW);
    let (bb_h, bb_l, bb_m) = bollinger(&close, BB_WINDOW, BB_DEV);
    let width = bb_width(&bb_h, &bb_l, &bb_m);
    let atr_series = atr(bars, ATR_WINDOW);
    let (kc_h, kc_l) = keltner(bars, KC_WINDOW, KC_ATR_WINDOW, KC_MULTIPLIER);
    let squeeze = squeeze_on(&bb_h, &bb_l, &kc_h, &kc_l);
    let mfi_series = mfi(bars, MFI_WINDOW);
    let obv_series = obv(bars);
    let obv_slope_series = obv_slope(&obv_series, OBV_SLOPE_LAG);
    let cmf_series = cmf(bars, CMF_WINDOW);
    let vwap_series = vwap(bars);
    let (don_h, don_l, don_m) = donchian(bars, DONCHIAN_WINDOW);
    let (break_up, break_down) = breakouts(bars, &don_h, &don_l);
    let chop = choppiness(bars, CHOP_WINDOW);

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let bar = &bars[i];
        let atr_i = atr_series[i];

        // ATR as a fraction of price, floored at zero
        let atr_pct = atr_i.and_then(|a| {
            if bar.close != 0.0 {
                Some((a / bar.close).max(0.0))
            } else {
                None
            }
        });

        // Distance from the Bollinger midline in ATR units
        let dist_from_mid_atr = match (bb_m[i], atr_i) {
            (Some(mid), Some(a)) if a > 0.0 => {
                let d = (bar.close - mid).abs() / a;
                d.is_finite().then_some(d)
            }
            _ => None,
        };

        let vwap_dev_atr = match (vwap_series[i], atr_i) {
            (Some(v), Some(a)) if a > 0.0 => {
                let d = (bar.close - v) / a;
                d.is_finite().then_some(d)
            }
            _ => None,
        };

        out.push(EnrichedBar {
            ts: bar.ts,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            ema_fast_slope: ema_fast_slope[i],
            ema_slow_slope: ema_slow_slope[i],
            macd: macd_line[i],
            macd_signal: macd_sig[i],
            macd_hist: macd_hist[i],
            rsi: rsi_series[i],
            stoch_rsi: stoch[i],
            stoch_rsi_k: stoch_k[i],
            stoch_rsi_d: stoch_d[i],
            adx: adx_series[i],
            bb_high: bb_h[i],
            bb_low: bb_l[i],
            bb_mid: bb_m[i],
            bb_width: width[i],
            atr: atr_i,
            atr_pct,
            kc_high: kc_h[i],
            kc_low: kc_l[i],
            squeeze_on: squeeze[i],
            dist_from_mid_atr,
            donchian_high: don_h[i],
            donchian_low: don_l[i],
            donchian_mid: don_m[i],
            donchian_break_up: break_up[i],
            donchian_break_down: break_down[i],
            choppiness: chop[i],
            mfi: mfi_series[i],
            obv: obv_series[i],
            obv_slope: obv_slope_series[i],
            cmf: cmf_series[i],
            vwap: vwap_series[i],
            vwap_dev_atr,
            above_vwap: vwap_series[i].map(|v| bar.close > v).unwrap_or(false),
        });
    }
    out
}

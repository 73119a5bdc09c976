//! Signal-side domain types: side, vote components, regime flags, signal rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction decision for a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
    Hold,
}

impl Side {
    /// Signed direction: +1 for BUY, -1 for SELL, 0 for HOLD.
    pub fn direction(&self) -> i8 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
            Side::Hold => 0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
            Side::Hold => f.write_str("HOLD"),
        }
    }
}

/// Regime gates. These veto trades; they never contribute direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegimeFlags {
    pub adx_ok: bool,
    pub vol_ok: bool,
}

impl RegimeFlags {
    pub fn both_ok(&self) -> bool {
        self.adx_ok && self.vol_ok
    }
}

/// Signed contributions to the directional vote, one per indicator family.
///
/// Only the EMA composite is hard-capped to [-1, 1]; the total is nominally
/// bounded to roughly [-4, +4] by construction but never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VoteComponents {
    pub ema: f64,
    pub macd_hist: f64,
    pub rsi: f64,
    pub bb_position: f64,
    pub stoch_rsi: f64,
    pub vwap: f64,
    pub donchian: f64,
    pub obv_slope: f64,
    pub vwap_dev: f64,
}

impl VoteComponents {
    /// The directional vote: plain sum of the components.
    pub fn total(&self) -> f64 {
        self.ema
            + self.macd_hist
            + self.rsi
            + self.bb_position
            + self.stoch_rsi
            + self.vwap
            + self.donchian
            + self.obv_slope
            + self.vwap_dev
    }
}

/// One signal decision per base-timeframe bar; produced once, immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub ts: DateTime<Utc>,
    pub close: f64,
    pub atr: Option<f64>,
    pub rsi: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub atr_pct: Option<f64>,
    pub adx: Option<f64>,
    pub side: Side,
    pub score: f64,
}

/// Directional votes for each timeframe, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MtfVotes {
    pub base: f64,
    pub h1: f64,
    pub h4: f64,
}

/// Live signal payload for a symbol: the latest decision plus the numeric
/// context needed to act on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub symbol: String,
    pub side: Side,
    pub score: f64,
    /// Dynamic threshold that was applied to this signal.
    pub threshold: f64,
    pub price: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub atr_pct: Option<f64>,
    pub adx: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub votes: MtfVotes,
    pub filters: RegimeFlags,
    pub as_of: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"SELL\"");
        assert_eq!(serde_json::to_string(&Side::Hold).unwrap(), "\"HOLD\"");
    }

    #[test]
    fn side_directions() {
        assert_eq!(Side::Buy.direction(), 1);
        assert_eq!(Side::Sell.direction(), -1);
        assert_eq!(Side::Hold.direction(), 0);
    }

    #[test]
    fn vote_total_is_component_sum() {
        let votes = VoteComponents {
            ema: 1.0,
            macd_hist: -1.0,
            rsi: 0.5,
            bb_position: 0.5,
            stoch_rsi: -0.5,
            vwap: 0.25,
            donchian: 0.25,
            obv_slope: 0.2,
            vwap_dev: -0.25,
        };
        assert!((votes.total() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn regime_flags_both_ok() {
        assert!(RegimeFlags { adx_ok: true, vol_ok: true }.both_ok());
        assert!(!RegimeFlags { adx_ok: true, vol_ok: false }.both_ok());
    }
}

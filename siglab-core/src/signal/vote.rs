//! The directional vote: independent signed contributions per indicator family.

use crate::domain::VoteComponents;
use crate::indicators::EnrichedBar;

/// Compute the vote components for one enriched bar.
///
/// Any component whose required fields are undefined contributes 0. Only the
/// EMA composite is hard-capped to [-1, 1]; the total is left unclamped.
pub fn directional_vote(bar: &EnrichedBar) -> VoteComponents {
    let mut votes = VoteComponents::default();

    // EMA composite: crossover plus both slope signs, capped
    let mut ema = 0.0f64;
    if let (Some(fast), Some(slow)) = (bar.ema_fast, bar.ema_slow) {
        ema += if fast > slow { 0.6 } else { -0.6 };
    }
    if let Some(s) = bar.ema_fast_slope {
        ema += if s > 0.0 { 0.2 } else { -0.2 };
    }
    if let Some(s) = bar.ema_slow_slope {
        ema += if s > 0.0 { 0.2 } else { -0.2 };
    }
    votes.ema = ema.clamp(-1.0, 1.0);

    if let Some(h) = bar.macd_hist {
        votes.macd_hist = if h > 0.0 { 1.0 } else { -1.0 };
    }

    // RSI with a wide neutral band to reduce chop
    if let Some(rsi) = bar.rsi {
        if rsi >= 55.0 {
            votes.rsi = 0.5;
        } else if rsi <= 45.0 {
            votes.rsi = -0.5;
        }
    }

    if let Some(mid) = bar.bb_mid {
        votes.bb_position = if bar.close > mid { 0.5 } else { -0.5 };
    }

    // StochRSI extremity fades stretched moves
    if let (Some(k), Some(d)) = (bar.stoch_rsi_k, bar.stoch_rsi_d) {
        if k > 0.8 && d > 0.8 {
            votes.stoch_rsi = -0.5;
        } else if k < 0.2 && d < 0.2 {
            votes.stoch_rsi = 0.5;
        }
    }

    if let Some(vwap) = bar.vwap {
        votes.vwap = if bar.close > vwap { 0.25 } else { -0.25 };
    }

    if bar.donchian_break_up {
        votes.donchian = 0.25;
    } else if bar.donchian_break_down {
        votes.donchian = -0.25;
    }

    if let Some(s) = bar.obv_slope {
        votes.obv_slope = if s > 0.0 { 0.2 } else { -0.2 };
    }

    // Deviation extremity fades overextension from fair value
    if let Some(dev) = bar.vwap_dev_atr {
        if dev > 1.5 {
            votes.vwap_dev = -0.25;
        } else if dev < -1.5 {
            votes.vwap_dev = 0.25;
        }
    }

    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::testutil::{empty_bar, healthy_bar};
    use proptest::prelude::*;

    #[test]
    fn undefined_fields_contribute_zero() {
        let votes = directional_vote(&empty_bar());
        assert_eq!(votes, VoteComponents::default());
        assert_eq!(votes.total(), 0.0);
    }

    #[test]
    fn bullish_bar_votes_positive() {
        let votes = directional_vote(&healthy_bar());
        assert!((votes.ema - 1.0).abs() < 1e-12);
        assert!((votes.macd_hist - 1.0).abs() < 1e-12);
        assert!((votes.rsi - 0.5).abs() < 1e-12);
        assert!((votes.bb_position - 0.5).abs() < 1e-12);
        assert!(votes.total() > 2.0);
    }

    #[test]
    fn ema_component_is_capped() {
        let mut bar = healthy_bar();
        bar.ema_fast = Some(110.0);
        bar.ema_slow = Some(100.0);
        bar.ema_fast_slope = Some(1.0);
        bar.ema_slow_slope = Some(1.0);
        // 0.6 + 0.2 + 0.2 = 1.0, capped exactly at the bound
        assert!((directional_vote(&bar).ema - 1.0).abs() < 1e-12);

        bar.ema_fast = Some(90.0);
        bar.ema_fast_slope = Some(-1.0);
        bar.ema_slow_slope = Some(-1.0);
        assert!((directional_vote(&bar).ema + 1.0).abs() < 1e-12);
    }

    #[test]
    fn stoch_rsi_extremity_fades() {
        let mut bar = healthy_bar();
        bar.stoch_rsi_k = Some(0.9);
        bar.stoch_rsi_d = Some(0.85);
        assert!((directional_vote(&bar).stoch_rsi + 0.5).abs() < 1e-12);
        bar.stoch_rsi_k = Some(0.1);
        bar.stoch_rsi_d = Some(0.15);
        assert!((directional_vote(&bar).stoch_rsi - 0.5).abs() < 1e-12);
        // One side extreme is not enough
        bar.stoch_rsi_d = Some(0.5);
        assert_eq!(directional_vote(&bar).stoch_rsi, 0.0);
    }

    #[test]
    fn vwap_dev_extremity_fades() {
        let mut bar = healthy_bar();
        bar.vwap_dev_atr = Some(2.0);
        assert!((directional_vote(&bar).vwap_dev + 0.25).abs() < 1e-12);
        bar.vwap_dev_atr = Some(-2.0);
        assert!((directional_vote(&bar).vwap_dev - 0.25).abs() < 1e-12);
        bar.vwap_dev_atr = Some(1.0);
        assert_eq!(directional_vote(&bar).vwap_dev, 0.0);
    }

    #[test]
    fn donchian_breakout_votes() {
        let mut bar = healthy_bar();
        bar.donchian_break_up = true;
        assert!((directional_vote(&bar).donchian - 0.25).abs() < 1e-12);
        bar.donchian_break_up = false;
        bar.donchian_break_down = true;
        assert!((directional_vote(&bar).donchian + 0.25).abs() < 1e-12);
    }

    proptest! {
        /// The vote is bounded and a pure function of its input.
        #[test]
        fn vote_is_bounded_and_deterministic(
            ema_fast in proptest::option::of(50.0..150.0f64),
            ema_slow in proptest::option::of(50.0..150.0f64),
            macd_hist in proptest::option::of(-5.0..5.0f64),
            rsi in proptest::option::of(0.0..100.0f64),
            close in 50.0..150.0f64,
            bb_mid in proptest::option::of(50.0..150.0f64),
            k in proptest::option::of(0.0..1.0f64),
            d in proptest::option::of(0.0..1.0f64),
            vwap in proptest::option::of(50.0..150.0f64),
            obv_slope in proptest::option::of(-1e6..1e6f64),
            dev in proptest::option::of(-5.0..5.0f64),
        ) {
            let mut bar = empty_bar();
            bar.close = close;
            bar.ema_fast = ema_fast;
            bar.ema_slow = ema_slow;
            bar.macd_hist = macd_hist;
            bar.rsi = rsi;
            bar.bb_mid = bb_mid;
            bar.stoch_rsi_k = k;
            bar.stoch_rsi_d = d;
            bar.vwap = vwap;
            bar.obv_slope = obv_slope;
            bar.vwap_dev_atr = dev;

            let first = directional_vote(&bar);
            let second = directional_vote(&bar);
            prop_assert_eq!(first, second);

            let total = first.total();
            prop_assert!(total.is_finite());
            prop_assert!((-4.0..=4.0).contains(&total), "vote out of range: {}", total);
        }
    }
}

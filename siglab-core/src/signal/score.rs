//! Confidence score: normalized votes, timeframe alignment, regime bonus.

use crate::domain::{MtfVotes, RegimeFlags};

/// Weight of each timeframe in the raw score. Higher timeframes are
/// upweighted relative to their vote magnitude for stability.
const W_BASE: f64 = 0.45;
const W_H1: f64 = 0.30;
const W_H4: f64 = 0.15;

/// Bonus per higher timeframe agreeing in sign with the base vote.
const ALIGN_BONUS: f64 = 0.25;

/// Bonus or penalty per regime flag.
const REGIME_WEIGHT: f64 = 0.2;

/// Map a directional vote from its nominal [-3, 3] core range to [0, 1].
fn norm(v: f64) -> f64 {
    ((v + 3.0) / 6.0).clamp(0.0, 1.0)
}

/// Compute the confidence score from the three timeframe votes and the
/// base-bar regime flags. Always in [0, 1].
pub fn score_from_votes(votes: &MtfVotes, flags: &RegimeFlags) -> f64 {
    let mut align = 0.0;
    if votes.base > 0.0 {
        if votes.h1 >= 0.0 {
            align += ALIGN_BONUS;
        }
        if votes.h4 >= 0.0 {
            align += ALIGN_BONUS;
        }
    } else if votes.base < 0.0 {
        if votes.h1 <= 0.0 {
            align += ALIGN_BONUS;
        }
        if votes.h4 <= 0.0 {
            align += ALIGN_BONUS;
        }
    }

    let regime = if flags.adx_ok { REGIME_WEIGHT } else { -REGIME_WEIGHT }
        + if flags.vol_ok { REGIME_WEIGHT } else { -REGIME_WEIGHT };

    let raw = W_BASE * norm(votes.base) + W_H1 * norm(votes.h1) + W_H4 * norm(votes.h4)
        + align
        + regime;
    raw.clamp(0.0, 1.0)
}

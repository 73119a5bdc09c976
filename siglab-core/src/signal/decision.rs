//! The multi-timeframe side decision.

use crate::domain::{MtfVotes, RegimeFlags, Side};

use super::score::score_from_votes;

/// Higher-timeframe tolerance when both HTFs clearly agree with the base
/// direction: minor counter-votes are forgiven up to this magnitude.
const HTF_TOLERANCE_BIASED: f64 = 0.25;
/// Tolerance without a clear HTF bias.
const HTF_TOLERANCE_DEFAULT: f64 = 0.1;
/// HTF vote magnitude that establishes a bias.
const HTF_BIAS_MIN: f64 = 0.5;

/// Score bounds for the override of a borderline HOLD. The override needs
/// at least one regime gate open; in a fully dead regime a skewed score
/// must not conjure a direction both gates rejected.
const OVERRIDE_BUY_MIN: f64 = 0.6;
const OVERRIDE_SELL_MAX: f64 = 0.4;

/// Decide the side for one base bar from the three timeframe votes and the
/// base-bar regime flags. Returns the side together with its score.
pub fn decide_side(votes: &MtfVotes, flags: &RegimeFlags) -> (Side, f64) {
    let bias_long = votes.h1 >= HTF_BIAS_MIN && votes.h4 >= HTF_BIAS_MIN;
    let bias_short = votes.h1 <= -HTF_BIAS_MIN && votes.h4 <= -HTF_BIAS_MIN;

    let long_floor = if bias_long { -HTF_TOLERANCE_BIASED } else { -HTF_TOLERANCE_DEFAULT };
    let short_ceil = if bias_short { HTF_TOLERANCE_BIASED } else { HTF_TOLERANCE_DEFAULT };

    let mut side = Side::Hold;
    if votes.base > 0.0
        && votes.h1 >= long_floor
        && votes.h4 >= long_floor
        && flags.both_ok()
    {
        side = Side::Buy;
    } else if votes.base < 0.0
        && votes.h1 <= short_ceil
        && votes.h4 <= short_ceil
        && flags.both_ok()
    {
        side = Side::Sell;
    }

    let score = score_from_votes(votes, flags);

    // Strong scores break a borderline HOLD, but never in a dead regime
    if side == Side::Hold && (flags.adx_ok || flags.vol_ok) {
        if score >= OVERRIDE_BUY_MIN {
            side = Side::Buy;
        } else if score <= OVERRIDE_SELL_MAX {
            side = Side::Sell;
        }
    }

    (side, score)
}

//! The regime-filtered vote model: per-bar votes, multi-timeframe side
//! decision, confidence score, dynamic threshold, and adaptive levels.

pub mod decision;
pub mod levels;
pub mod regime;
pub mod score;
pub mod threshold;
pub mod vote;

pub use decision::decide_side;
pub use levels::adaptive_sl_tp;
pub use regime::regime_filters;
pub use score::score_from_votes;
pub use threshold::dynamic_threshold;
pub use vote::directional_vote;

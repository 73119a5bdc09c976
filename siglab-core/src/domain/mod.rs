//! Domain types: bars, timeframes, sides, votes, signal rows.

pub mod bar;
pub mod signal;

pub use bar::{Bar, Timeframe};
pub use signal::{MtfVotes, RegimeFlags, Side, SignalReport, SignalRow, VoteComponents};

//! Bar provider trait and structured error types.
//!
//! The BarProvider trait abstracts over market-data sources so the service
//! layer can swap implementations and mock for tests.

use thiserror::Error;

use crate::domain::{Bar, Timeframe};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("empty payload from {0}")]
    EmptyPayload(String),

    #[error("insufficient rows for {symbol} {timeframe}: got {got}, need {need}")]
    InsufficientRows {
        symbol: String,
        timeframe: Timeframe,
        got: usize,
        need: usize,
    },

    #[error("all data sources failed: {0}")]
    AllSourcesFailed(String),
}

/// Trait for market-data providers.
///
/// Implementations handle the specifics of a particular exchange API. The
/// cache layer sits above this trait — providers don't know about the cache.
/// Returned bars are ordered ascending by timestamp and unique per timestamp.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch up to `limit` most recent bars for a symbol and timeframe.
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError>;
}

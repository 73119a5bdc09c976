//! Market data: provider trait, the Binance implementation, and the TTL
//! cache layer that sits above providers.

pub mod binance;
pub mod cache;
pub mod provider;

pub use binance::BinanceProvider;
pub use cache::{Clock, SystemClock, TtlCache};
pub use provider::{BarProvider, DataError};

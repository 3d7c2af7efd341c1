//! Market data port: latest price and OHLCV history.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;

pub trait MarketDataPort {
    /// Last traded price, strictly positive. Fails with `FeedUnavailable`.
    fn latest_price(&self, symbol: &str) -> Result<f64, SignalError>;

    /// Up to `count` most recent bars, oldest first. Short history is not an
    /// error: the caller sees fewer bars and reports `InsufficientData`.
    fn bars(&self, symbol: &str, timeframe: &str, count: usize) -> Result<Vec<OhlcvBar>, SignalError>;
}

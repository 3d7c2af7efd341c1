//! Volatility-driven re-pricing of the threshold levels.
//!
//! `adjust` is pure: it returns a new `SymbolConfig` and never touches the
//! caller's copy.

use crate::domain::config::SymbolConfig;
use crate::domain::indicator::{IndicatorValue, calculate_atr};
use crate::domain::ohlcv::OhlcvBar;

pub const VOLATILITY_THRESHOLD: f64 = 0.02;
pub const PRICE_ADJUSTMENT: f64 = 0.01;

/// Latest ATR over `window` bars relative to `price`. `None` until the ATR
/// has warmed up.
pub fn market_volatility(bars: &[OhlcvBar], window: usize, price: f64) -> Option<f64> {
    if price <= 0.0 {
        return None;
    }
    let atr = calculate_atr(bars, window);
    match atr.values.last() {
        Some(point) if point.valid => match point.value {
            IndicatorValue::Simple(v) => Some(v / price),
            _ => None,
        },
        _ => None,
    }
}

/// Quote precision used when re-pricing a symbol.
pub fn price_decimals(symbol: &str) -> u32 {
    let base = symbol.to_uppercase();
    if base.starts_with("BTC") || base.starts_with("ETH") {
        2
    } else if base.starts_with("DOGE") {
        6
    } else {
        4
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Recentre buy/sell levels around `price` when volatility exceeds the
/// threshold; otherwise return the config unchanged.
pub fn adjust(config: &SymbolConfig, volatility: f64, price: f64) -> SymbolConfig {
    if volatility <= VOLATILITY_THRESHOLD {
        return config.clone();
    }

    let decimals = price_decimals(&config.symbol);
    SymbolConfig {
        buy_price: Some(round_to(price * (1.0 - PRICE_ADJUSTMENT), decimals)),
        sell_price: Some(round_to(price * (1.0 + PRICE_ADJUSTMENT), decimals)),
        ..config.clone()
    }
}

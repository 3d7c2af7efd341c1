//! Fixed price-threshold strategy.
//!
//! Buy below `buy_price`. Sell above `sell_price` when one is set, or once the
//! gain passes `take_profit_pct`. Stop out below `entry_price * stop_loss_ratio`.
//! Indicators are ignored.

use crate::domain::config::{StopLossMethod, SymbolConfig};
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::position::PositionState;
use crate::domain::strategy::TradingStrategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdStrategy;

impl TradingStrategy for ThresholdStrategy {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn uses_indicators(&self) -> bool {
        false
    }

    fn should_buy(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        _indicators: &IndicatorSnapshot,
    ) -> bool {
        !position.holding && config.buy_price.is_some_and(|buy| price < buy)
    }

    fn should_sell(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        _indicators: &IndicatorSnapshot,
    ) -> bool {
        position.entry().is_some_and(|(entry, _)| {
            (price - entry) / entry > config.take_profit_pct
                || config.sell_price.is_some_and(|sell| price > sell)
        })
    }

    fn should_stop_loss(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        _indicators: &IndicatorSnapshot,
    ) -> Option<StopLossMethod> {
        let (entry, _) = position.entry()?;
        (price < entry * config.stop_loss_ratio).then_some(StopLossMethod::Fixed)
    }
}

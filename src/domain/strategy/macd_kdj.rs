//! MACD + KDJ crossover strategy with priority-ordered stop-loss methods.
//!
//! Buy: (DIF crosses above DEA, or K crosses above D) and J[-1] < max_j_buy.
//! Sell: (DIF crosses below DEA, or J[-1] > min_j_sell) and the fee-aware
//! profit filter passes. A filtered sell is deferred to the next tick.
//! Stop-loss: the first method in `stop_loss_priority` that fires.

use tracing::debug;

use crate::domain::config::{StopLossMethod, SymbolConfig};
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::position::PositionState;
use crate::domain::profit::ProfitBreakdown;
use crate::domain::strategy::TradingStrategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct MacdKdjStrategy;

impl MacdKdjStrategy {
    fn method_fires(
        method: StopLossMethod,
        price: f64,
        entry_price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        indicators: &IndicatorSnapshot,
    ) -> bool {
        match method {
            StopLossMethod::Fixed => price < entry_price * (1.0 - config.fixed_stop_loss_pct),
            StopLossMethod::Atr => indicators
                .last_atr()
                .is_some_and(|atr| price < entry_price - config.atr_stop_multiplier * atr),
            StopLossMethod::Macd => indicators.trend_death_cross() && price < entry_price,
            StopLossMethod::Drawdown => position
                .max_price
                .filter(|&max| max > 0.0)
                .is_some_and(|max| (max - price) / max >= config.max_drawdown_pct),
            StopLossMethod::Trailing => position
                .trailing_stop_price
                .is_some_and(|stop| price < stop),
        }
    }
}

impl TradingStrategy for MacdKdjStrategy {
    fn name(&self) -> &'static str {
        "macd_kdj"
    }

    fn should_buy(
        &self,
        _price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        indicators: &IndicatorSnapshot,
    ) -> bool {
        if position.holding || !indicators.is_sufficient() {
            return false;
        }

        let crossed = indicators.trend_golden_cross() || indicators.kdj_golden_cross();
        crossed && indicators.last_j().is_some_and(|j| j < config.max_j_buy)
    }

    fn should_sell(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        indicators: &IndicatorSnapshot,
    ) -> bool {
        if !position.holding || !indicators.is_sufficient() {
            return false;
        }

        let overheated = indicators.last_j().is_some_and(|j| j > config.min_j_sell);
        if !(indicators.trend_death_cross() || overheated) {
            return false;
        }

        let Some((entry_price, amount)) = position.entry() else {
            return false;
        };
        let profit = ProfitBreakdown::compute(
            entry_price,
            amount,
            position.buy_fee.unwrap_or(0.0),
            price,
            config.fee_rate,
        );
        if profit.clears(config.min_profit_pct) {
            return true;
        }

        debug!(
            symbol = %config.symbol,
            price,
            net_profit = profit.net_profit,
            min_profit = profit.min_profit_value(config.min_profit_pct),
            "sell signal deferred: net profit below minimum"
        );
        false
    }

    fn should_stop_loss(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        indicators: &IndicatorSnapshot,
    ) -> Option<StopLossMethod> {
        let entry_price = position.entry_price.filter(|&p| position.holding && p > 0.0)?;

        config
            .stop_loss_priority
            .iter()
            .copied()
            .find(|&method| {
                Self::method_fires(method, price, entry_price, position, config, indicators)
            })
    }
}

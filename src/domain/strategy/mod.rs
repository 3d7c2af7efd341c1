//! Trading strategies.
//!
//! A strategy answers three questions about one symbol on one tick: should
//! the position be opened, closed for profit, or closed for loss. `evaluate`
//! resolves them into a single `Verdict` in the fixed order
//! Buy > Sell > StopLoss > Hold. The holding gate inside each predicate makes
//! Buy mutually exclusive with the other two.
//!
//! The driver picks one strategy per deployment via `StrategyKind`.

pub mod macd_kdj;
pub mod threshold;

use std::fmt;
use std::str::FromStr;

use crate::domain::config::{StopLossMethod, SymbolConfig};
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::position::PositionState;
use crate::domain::verdict::Verdict;

pub use macd_kdj::MacdKdjStrategy;
pub use threshold::ThresholdStrategy;

pub trait TradingStrategy {
    fn name(&self) -> &'static str;

    /// Whether the predicates read the indicator snapshot.
    fn uses_indicators(&self) -> bool {
        true
    }

    fn should_buy(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        indicators: &IndicatorSnapshot,
    ) -> bool;

    fn should_sell(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        indicators: &IndicatorSnapshot,
    ) -> bool;

    /// The first stop-loss method that fires, if any.
    fn should_stop_loss(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        indicators: &IndicatorSnapshot,
    ) -> Option<StopLossMethod>;

    fn evaluate(
        &self,
        price: f64,
        position: &PositionState,
        config: &SymbolConfig,
        indicators: &IndicatorSnapshot,
    ) -> Verdict {
        if self.should_buy(price, position, config, indicators) {
            Verdict::Buy
        } else if self.should_sell(price, position, config, indicators) {
            Verdict::Sell
        } else if let Some(reason) = self.should_stop_loss(price, position, config, indicators) {
            Verdict::StopLoss(reason)
        } else {
            Verdict::Hold
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    MacdKdj,
    Threshold,
}

impl StrategyKind {
    pub fn build(&self) -> Box<dyn TradingStrategy> {
        match self {
            StrategyKind::MacdKdj => Box::new(MacdKdjStrategy),
            StrategyKind::Threshold => Box::new(ThresholdStrategy),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::MacdKdj => "macd_kdj",
            StrategyKind::Threshold => "threshold",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "macd_kdj" | "macd-kdj" | "macdkdj" => Ok(StrategyKind::MacdKdj),
            "threshold" | "simple_threshold" => Ok(StrategyKind::Threshold),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

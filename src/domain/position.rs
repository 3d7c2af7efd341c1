//! Per-symbol position and risk state.

use serde::{Deserialize, Serialize};

use crate::domain::config::StopLossMethod;

/// Position record for one symbol. Unset fields serialize as `null`; missing
/// fields deserialize as unset so older position files still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionState {
    pub holding: bool,
    pub entry_price: Option<f64>,
    pub amount: Option<f64>,
    pub buy_fee: Option<f64>,
    pub trailing_stop_price: Option<f64>,
    pub max_price: Option<f64>,
    pub stop_reason: Option<StopLossMethod>,
}

impl PositionState {
    /// Entry price and amount of an open position.
    pub fn entry(&self) -> Option<(f64, f64)> {
        match (self.holding, self.entry_price, self.amount) {
            (true, Some(price), Some(amount)) if price > 0.0 && amount > 0.0 => {
                Some((price, amount))
            }
            _ => None,
        }
    }

    /// Checks the structural invariants of the record.
    pub fn is_consistent(&self) -> bool {
        if !self.holding {
            return self.entry_price.is_none()
                && self.amount.is_none()
                && self.buy_fee.is_none()
                && self.trailing_stop_price.is_none()
                && self.max_price.is_none();
        }
        if self.entry().is_none() {
            return false;
        }
        match (self.trailing_stop_price, self.max_price) {
            (Some(stop), Some(max)) => stop <= max,
            _ => true,
        }
    }
}

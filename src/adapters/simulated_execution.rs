//! Dry-run execution: every order is confirmed immediately.

use std::cell::Cell;

use chrono::Utc;
use tracing::info;

use crate::domain::error::SignalError;
use crate::ports::execution_port::{ExecutionPort, OrderReceipt, OrderSide, OrderType};

/// Fills the full amount. Market orders report no fill price, so callers use
/// the quoted price; limit orders fill at their limit.
#[derive(Debug, Default)]
pub struct SimulatedExecution {
    next_id: Cell<u64>,
}

impl SimulatedExecution {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionPort for SimulatedExecution {
    fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        order_type: OrderType,
    ) -> Result<OrderReceipt, SignalError> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(SignalError::OrderRejected {
                symbol: symbol.to_string(),
                reason: format!("invalid amount {amount}"),
            });
        }

        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let avg_price = match order_type {
            OrderType::Market => None,
            OrderType::Limit { price } => Some(price),
        };

        info!(symbol, side = %side, amount, order_id = id, "simulated order filled");

        Ok(OrderReceipt {
            order_id: format!("sim-{id}"),
            symbol: symbol.to_string(),
            side,
            filled: amount,
            avg_price,
            timestamp: Utc::now(),
        })
    }
}

//! Order execution port.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::error::SignalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("buy"),
            OrderSide::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderType {
    Market,
    Limit { price: f64 },
}

/// Confirmation of an accepted order. `avg_price` is `None` when the venue
/// does not report a fill price; callers then use the quoted price.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub filled: f64,
    pub avg_price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

pub trait ExecutionPort {
    /// Fails with `OrderRejected` when the venue refuses the order.
    fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        order_type: OrderType,
    ) -> Result<OrderReceipt, SignalError>;
}

//! Decision outcomes and the trade events they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::config::StopLossMethod;

/// Outcome of one evaluation. Variants are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Buy,
    Sell,
    StopLoss(StopLossMethod),
    Hold,
}

impl Verdict {
    pub fn action(&self) -> Option<TradeAction> {
        match self {
            Verdict::Buy => Some(TradeAction::Buy),
            Verdict::Sell => Some(TradeAction::Sell),
            Verdict::StopLoss(_) => Some(TradeAction::StopLoss),
            Verdict::Hold => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Buy => f.write_str("buy"),
            Verdict::Sell => f.write_str("sell"),
            Verdict::StopLoss(reason) => write!(f, "stop_loss({reason})"),
            Verdict::Hold => f.write_str("hold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
    StopLoss,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
            TradeAction::StopLoss => "stop_loss",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record handed to notification and ledger sinks after an executed verdict.
/// `net_profit` and `pct` are `None` for buys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub symbol: String,
    pub action: TradeAction,
    pub price: f64,
    pub amount: f64,
    pub net_profit: Option<f64>,
    pub pct: Option<f64>,
    pub reason: Option<StopLossMethod>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {:.6}",
            self.action, self.amount, self.symbol, self.price
        )?;
        if let (Some(profit), Some(pct)) = (self.net_profit, self.pct) {
            write!(f, " net {profit:.6} ({pct:.2}%)")?;
        }
        if let Some(reason) = self.reason {
            write!(f, " [{reason}]")?;
        }
        Ok(())
    }
}

//! Fee-aware profit accounting for voluntary exits.
//!
//! sell_total       = price * amount
//! sell_fee         = sell_total * fee_rate
//! net_profit       = sell_total - entry_price * amount - buy_fee - sell_fee
//! min_profit_value = entry_price * amount * (min_profit_pct / 100)
//!
//! A sell passes iff `net_profit >= min_profit_value`. Stop-loss exits never
//! consult this filter.

/// Round-trip profit of closing a position at `price`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitBreakdown {
    pub cost: f64,
    pub sell_total: f64,
    pub sell_fee: f64,
    pub net_profit: f64,
}

impl ProfitBreakdown {
    pub fn compute(entry_price: f64, amount: f64, buy_fee: f64, price: f64, fee_rate: f64) -> Self {
        let cost = entry_price * amount;
        let sell_total = price * amount;
        let sell_fee = sell_total * fee_rate;
        ProfitBreakdown {
            cost,
            sell_total,
            sell_fee,
            net_profit: sell_total - cost - buy_fee - sell_fee,
        }
    }

    /// Net profit as a percentage of the entry cost.
    pub fn pct(&self) -> f64 {
        if self.cost > 0.0 {
            self.net_profit / self.cost * 100.0
        } else {
            0.0
        }
    }

    pub fn min_profit_value(&self, min_profit_pct: f64) -> f64 {
        self.cost * (min_profit_pct / 100.0)
    }

    pub fn clears(&self, min_profit_pct: f64) -> bool {
        self.net_profit >= self.min_profit_value(min_profit_pct)
    }
}

/// Fee charged on the buy leg of an order.
pub fn buy_fee(price: f64, amount: f64, fee_rate: f64) -> f64 {
    price * amount * fee_rate
}

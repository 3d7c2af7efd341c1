//! Keyed store of per-symbol position state.
//!
//! The store is the only owner of `PositionState`; the mutation paths are
//! `open`, `reduce`, `close` and `update_trailing`. It performs no I/O: callers load
//! and save the underlying map through a `PositionPort`.

use std::collections::HashMap;

use crate::domain::config::StopLossMethod;
use crate::domain::position::PositionState;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionStore {
    positions: HashMap<String, PositionState>,
}

impl PositionStore {
    pub fn new() -> Self {
        PositionStore {
            positions: HashMap::new(),
        }
    }

    pub fn from_map(positions: HashMap<String, PositionState>) -> Self {
        PositionStore { positions }
    }

    pub fn positions(&self) -> &HashMap<String, PositionState> {
        &self.positions
    }

    /// Current state for `symbol`; unseen symbols are flat.
    pub fn get(&self, symbol: &str) -> PositionState {
        self.positions.get(symbol).cloned().unwrap_or_default()
    }

    pub fn is_holding(&self, symbol: &str) -> bool {
        self.positions.get(symbol).is_some_and(|p| p.holding)
    }

    /// Open a position. Panics if `symbol` is already held or the inputs are
    /// not positive: either means the caller skipped the holding gate.
    pub fn open(&mut self, symbol: &str, price: f64, amount: f64, fee: f64, trailing_pct: f64) {
        assert!(
            !self.is_holding(symbol),
            "open() called for {symbol} while already holding"
        );
        assert!(
            price > 0.0 && amount > 0.0,
            "open() requires positive price and amount for {symbol}"
        );

        self.positions.insert(
            symbol.to_string(),
            PositionState {
                holding: true,
                entry_price: Some(price),
                amount: Some(amount),
                buy_fee: Some(fee),
                trailing_stop_price: Some(price * (1.0 - trailing_pct)),
                max_price: Some(price),
                stop_reason: None,
            },
        );
    }

    /// Reset `symbol` to flat and return the state it had before.
    pub fn close(&mut self, symbol: &str) -> PositionState {
        self.positions
            .insert(symbol.to_string(), PositionState::default())
            .unwrap_or_default()
    }

    /// Take `amount` out of an open position after a partial exit fill and
    /// return the sold slice with its share of the buy fee. The remainder
    /// keeps its entry price, trailing stop and peak. Panics unless
    /// `0 < amount < held`: a full fill must go through `close`.
    pub fn reduce(&mut self, symbol: &str, amount: f64) -> PositionState {
        let pos = self
            .positions
            .get_mut(symbol)
            .filter(|p| p.holding)
            .unwrap_or_else(|| panic!("reduce() called for {symbol} while flat"));
        let held = pos.amount.unwrap_or(0.0);
        assert!(
            amount > 0.0 && amount < held,
            "reduce() needs 0 < amount < {held} for {symbol}, got {amount}"
        );

        let share = amount / held;
        let sold_fee = pos.buy_fee.map(|fee| fee * share);
        pos.amount = Some(held - amount);
        pos.buy_fee = pos.buy_fee.map(|fee| fee - fee * share);

        PositionState {
            amount: Some(amount),
            buy_fee: sold_fee,
            stop_reason: None,
            ..pos.clone()
        }
    }

    /// Record why a stop-loss fired. The tag lives until the next `close`.
    pub fn mark_stop_reason(&mut self, symbol: &str, reason: StopLossMethod) {
        if let Some(pos) = self.positions.get_mut(symbol).filter(|p| p.holding) {
            pos.stop_reason = Some(reason);
        }
    }

    /// Ratchet the trailing stop and peak price upward. Never lowers either.
    /// Returns whether anything changed; flat symbols are left untouched.
    pub fn update_trailing(&mut self, symbol: &str, price: f64, trailing_pct: f64) -> bool {
        let Some(pos) = self.positions.get_mut(symbol).filter(|p| p.holding) else {
            return false;
        };

        let mut changed = false;

        let candidate = price * (1.0 - trailing_pct);
        if pos.trailing_stop_price.is_none_or(|stop| candidate > stop) {
            pos.trailing_stop_price = Some(candidate);
            changed = true;
        }

        if pos.max_price.is_none_or(|max| price > max) {
            pos.max_price = Some(price);
            changed = true;
        }

        changed
    }
}

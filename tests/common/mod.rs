#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sigtrader::domain::config::{BotSettings, RuntimeConfig, SymbolConfig};
use sigtrader::domain::error::SignalError;
pub use sigtrader::domain::ohlcv::OhlcvBar;
use sigtrader::domain::position::PositionState;
use sigtrader::domain::strategy::StrategyKind;
use sigtrader::domain::verdict::TradeEvent;
use sigtrader::ports::event_port::EventPort;
use sigtrader::ports::execution_port::{ExecutionPort, OrderReceipt, OrderSide, OrderType};
use sigtrader::ports::market_data_port::MarketDataPort;
use sigtrader::ports::position_port::PositionPort;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Market data whose price and bars can be changed between ticks.
pub struct MockMarketData {
    pub prices: RefCell<HashMap<String, f64>>,
    pub bars: RefCell<HashMap<String, Vec<OhlcvBar>>>,
    pub errors: RefCell<HashMap<String, String>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            prices: RefCell::new(HashMap::new()),
            bars: RefCell::new(HashMap::new()),
            errors: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_price(self, symbol: &str, price: f64) -> Self {
        self.set_price(symbol, price);
        self
    }

    pub fn with_bars(self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.set_bars(symbol, bars);
        self
    }

    pub fn with_error(self, symbol: &str, reason: &str) -> Self {
        self.errors
            .borrow_mut()
            .insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.prices.borrow_mut().insert(symbol.to_string(), price);
    }

    pub fn set_bars(&self, symbol: &str, bars: Vec<OhlcvBar>) {
        self.bars.borrow_mut().insert(symbol.to_string(), bars);
    }
}

impl MarketDataPort for MockMarketData {
    fn latest_price(&self, symbol: &str) -> Result<f64, SignalError> {
        if let Some(reason) = self.errors.borrow().get(symbol) {
            return Err(SignalError::FeedUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        self.prices
            .borrow()
            .get(symbol)
            .copied()
            .ok_or_else(|| SignalError::FeedUnavailable {
                symbol: symbol.to_string(),
                reason: "no price".to_string(),
            })
    }

    fn bars(&self, symbol: &str, _timeframe: &str, count: usize) -> Result<Vec<OhlcvBar>, SignalError> {
        let bars = self.bars.borrow().get(symbol).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(count);
        Ok(bars[skip..].to_vec())
    }
}

/// Records every order; rejects all of them while `reject` is set.
/// Confirmed orders fill `fill_ratio` of the requested amount at `fill_price`.
pub struct MockExecution {
    pub orders: RefCell<Vec<(String, OrderSide, f64)>>,
    pub reject: Cell<bool>,
    pub fill_ratio: Cell<f64>,
    pub fill_price: Cell<Option<f64>>,
}

impl MockExecution {
    pub fn new() -> Self {
        Self {
            orders: RefCell::new(Vec::new()),
            reject: Cell::new(false),
            fill_ratio: Cell::new(1.0),
            fill_price: Cell::new(None),
        }
    }

    pub fn filling(ratio: f64) -> Self {
        let exec = Self::new();
        exec.fill_ratio.set(ratio);
        exec
    }

    pub fn rejecting() -> Self {
        let exec = Self::new();
        exec.reject.set(true);
        exec
    }

    pub fn sides(&self) -> Vec<OrderSide> {
        self.orders.borrow().iter().map(|(_, side, _)| *side).collect()
    }
}

impl ExecutionPort for MockExecution {
    fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        _order_type: OrderType,
    ) -> Result<OrderReceipt, SignalError> {
        if self.reject.get() {
            return Err(SignalError::OrderRejected {
                symbol: symbol.to_string(),
                reason: "insufficient balance".to_string(),
            });
        }
        let mut orders = self.orders.borrow_mut();
        orders.push((symbol.to_string(), side, amount));
        Ok(OrderReceipt {
            order_id: format!("mock-{}", orders.len()),
            symbol: symbol.to_string(),
            side,
            filled: amount * self.fill_ratio.get(),
            avg_price: self.fill_price.get(),
            timestamp: Utc::now(),
        })
    }
}

/// In-memory position persistence.
pub struct MemoryPositions {
    pub stored: RefCell<HashMap<String, PositionState>>,
    pub saves: Cell<usize>,
    pub fail_saves: Cell<bool>,
}

impl MemoryPositions {
    pub fn new() -> Self {
        Self {
            stored: RefCell::new(HashMap::new()),
            saves: Cell::new(0),
            fail_saves: Cell::new(false),
        }
    }

    pub fn with_position(self, symbol: &str, state: PositionState) -> Self {
        self.stored.borrow_mut().insert(symbol.to_string(), state);
        self
    }

    pub fn get(&self, symbol: &str) -> PositionState {
        self.stored.borrow().get(symbol).cloned().unwrap_or_default()
    }
}

impl PositionPort for MemoryPositions {
    fn load(&self) -> Result<HashMap<String, PositionState>, SignalError> {
        Ok(self.stored.borrow().clone())
    }

    fn save(&self, positions: &HashMap<String, PositionState>) -> Result<(), SignalError> {
        if self.fail_saves.get() {
            return Err(SignalError::Persistence {
                reason: "disk full".to_string(),
            });
        }
        *self.stored.borrow_mut() = positions.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

pub struct RecordingSink {
    pub events: RefCell<Vec<TradeEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
        }
    }
}

impl EventPort for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn publish(&self, event: &TradeEvent) -> Result<(), SignalError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}

pub struct FailingSink;

impl EventPort for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn publish(&self, _event: &TradeEvent) -> Result<(), SignalError> {
        Err(SignalError::Persistence {
            reason: "webhook unreachable".to_string(),
        })
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// One-minute bar with a symmetric range of `spread` around `close`.
pub fn make_bar(index: usize, close: f64, spread: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: base_time() + Duration::minutes(index as i64),
        open: close,
        high: close + spread,
        low: close - spread,
        close,
        volume: 1_000.0,
    }
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, c * 0.002))
        .collect()
}

pub fn flat_bars(count: usize, close: f64, spread: f64) -> Vec<OhlcvBar> {
    (0..count).map(|i| make_bar(i, close, spread)).collect()
}

pub fn holding_state(entry: f64, amount: f64, trailing_pct: f64) -> PositionState {
    PositionState {
        holding: true,
        entry_price: Some(entry),
        amount: Some(amount),
        buy_fee: Some(entry * amount * 0.001),
        trailing_stop_price: Some(entry * (1.0 - trailing_pct)),
        max_price: Some(entry),
        stop_reason: None,
    }
}

pub fn threshold_symbol(symbol: &str, buy_price: f64) -> SymbolConfig {
    SymbolConfig {
        buy_price: Some(buy_price),
        ..SymbolConfig::new(symbol, 1.0)
    }
}

pub fn runtime(strategy: StrategyKind, symbols: Vec<SymbolConfig>) -> RuntimeConfig {
    RuntimeConfig {
        bot: BotSettings {
            symbols: symbols.iter().map(|s| s.symbol.clone()).collect(),
            strategy,
            ..BotSettings::default()
        },
        symbols,
    }
}

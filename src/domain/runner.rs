//! Per-tick driver.
//!
//! One `tick` evaluates one symbol:
//! price -> bars -> indicator snapshot -> (volatility adjust) ->
//! trailing ratchet -> verdict -> order -> position mutation -> persist ->
//! publish.
//!
//! Position state changes only after the execution port confirms an order
//! with a usable fill. A partial exit fill keeps the unfilled remainder open.
//! Event sink failures are logged and never abort the tick.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::domain::config::{BotSettings, RuntimeConfig, SymbolConfig};
use crate::domain::error::SignalError;
use crate::domain::indicator::{IndicatorSnapshot, compute_snapshot};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::PositionState;
use crate::domain::position_store::PositionStore;
use crate::domain::profit::{ProfitBreakdown, buy_fee};
use crate::domain::strategy::TradingStrategy;
use crate::domain::verdict::{TradeAction, TradeEvent, Verdict};
use crate::domain::volatility;
use crate::ports::event_port::EventPort;
use crate::ports::execution_port::{ExecutionPort, OrderReceipt, OrderSide, OrderType};
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::position_port::PositionPort;

/// Result of one tick for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub symbol: String,
    pub price: f64,
    pub verdict: Verdict,
    pub event: Option<TradeEvent>,
}

/// Read-only view of what a tick would decide.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub symbol: String,
    pub price: f64,
    pub bars: usize,
    pub snapshot: IndicatorSnapshot,
    pub config: SymbolConfig,
    pub position: PositionState,
    pub verdict: Verdict,
}

struct Inputs {
    price: f64,
    bars: usize,
    snapshot: IndicatorSnapshot,
    config: SymbolConfig,
}

pub struct Runner<'a> {
    bot: BotSettings,
    configs: HashMap<String, SymbolConfig>,
    strategy: Box<dyn TradingStrategy>,
    store: PositionStore,
    market: &'a dyn MarketDataPort,
    execution: &'a dyn ExecutionPort,
    positions: &'a dyn PositionPort,
    sinks: Vec<&'a dyn EventPort>,
}

impl<'a> Runner<'a> {
    /// Build a runner and restore position state from `positions`.
    pub fn new(
        config: RuntimeConfig,
        strategy: Box<dyn TradingStrategy>,
        market: &'a dyn MarketDataPort,
        execution: &'a dyn ExecutionPort,
        positions: &'a dyn PositionPort,
        sinks: Vec<&'a dyn EventPort>,
    ) -> Result<Self, SignalError> {
        let loaded = positions.load()?;
        if let Some((symbol, state)) = loaded.iter().find(|(_, state)| !state.is_consistent()) {
            return Err(SignalError::Persistence {
                reason: format!("stored position for {symbol} is inconsistent: {state:?}"),
            });
        }
        let store = PositionStore::from_map(loaded);
        let configs = config
            .symbols
            .into_iter()
            .map(|c| (c.symbol.clone(), c))
            .collect();

        Ok(Runner {
            bot: config.bot,
            configs,
            strategy,
            store,
            market,
            execution,
            positions,
            sinks,
        })
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    pub fn settings(&self) -> &BotSettings {
        &self.bot
    }

    pub fn symbol_config(&self, symbol: &str) -> Option<&SymbolConfig> {
        self.configs.get(symbol)
    }

    /// Tick every configured symbol once, in configuration order.
    pub fn run_once(&mut self) -> Vec<(String, Result<TickOutcome, SignalError>)> {
        let symbols = self.bot.symbols.clone();
        symbols
            .into_iter()
            .map(|symbol| {
                let outcome = self.tick(&symbol);
                (symbol, outcome)
            })
            .collect()
    }

    pub fn tick(&mut self, symbol: &str) -> Result<TickOutcome, SignalError> {
        let inputs = self.gather(symbol)?;
        let price = inputs.price;
        let config = inputs.config;

        if self.bot.volatility_adjust {
            self.configs.insert(symbol.to_string(), config.clone());
        }

        if self.store.is_holding(symbol)
            && self.store.update_trailing(symbol, price, config.trailing_stop_pct)
        {
            let pos = self.store.get(symbol);
            debug!(
                symbol,
                trailing_stop = pos.trailing_stop_price,
                max_price = pos.max_price,
                "trailing stop ratcheted"
            );
            self.persist()?;
        }

        let position = self.store.get(symbol);
        let verdict = self
            .strategy
            .evaluate(price, &position, &config, &inputs.snapshot);

        let event = match verdict {
            Verdict::Hold => {
                info!(symbol, price, holding = position.holding, "no action");
                None
            }
            Verdict::Buy => Some(self.execute_buy(symbol, price, &config)?),
            Verdict::Sell | Verdict::StopLoss(_) => {
                Some(self.execute_exit(symbol, price, &config, &position, verdict)?)
            }
        };

        if let Some(event) = &event {
            self.persist()?;
            self.publish(event);
        }

        Ok(TickOutcome {
            symbol: symbol.to_string(),
            price,
            verdict,
            event,
        })
    }

    /// Decide without submitting orders or mutating state.
    pub fn evaluate(&self, symbol: &str) -> Result<Evaluation, SignalError> {
        let inputs = self.gather(symbol)?;

        let mut preview = self.store.clone();
        if preview.is_holding(symbol) {
            preview.update_trailing(symbol, inputs.price, inputs.config.trailing_stop_pct);
        }
        let position = preview.get(symbol);
        let verdict = self
            .strategy
            .evaluate(inputs.price, &position, &inputs.config, &inputs.snapshot);

        Ok(Evaluation {
            symbol: symbol.to_string(),
            price: inputs.price,
            bars: inputs.bars,
            snapshot: inputs.snapshot,
            config: inputs.config,
            position,
            verdict,
        })
    }

    fn gather(&self, symbol: &str) -> Result<Inputs, SignalError> {
        let base = self
            .configs
            .get(symbol)
            .ok_or_else(|| SignalError::ConfigMissing {
                section: symbol.to_string(),
                key: "amount".to_string(),
            })?;

        let price = self.market.latest_price(symbol)?;
        if !price.is_finite() || price <= 0.0 {
            return Err(SignalError::FeedUnavailable {
                symbol: symbol.to_string(),
                reason: format!("invalid price {price}"),
            });
        }
        info!(symbol, price, "latest price");

        let bars = self
            .market
            .bars(symbol, &self.bot.timeframe, self.bot.bar_limit)?;

        let snapshot = match compute_snapshot(symbol, &bars, &base.indicators) {
            Ok(snapshot) => {
                log_snapshot(symbol, &self.bot.timeframe, &snapshot);
                snapshot
            }
            Err(SignalError::InsufficientData { have, need, .. }) => {
                if self.strategy.uses_indicators() {
                    warn!(
                        symbol,
                        bars = bars.len(),
                        have,
                        need,
                        "insufficient indicator history; indicator signals disabled this tick"
                    );
                }
                IndicatorSnapshot::default()
            }
            Err(e) => return Err(e),
        };

        let config = if self.bot.volatility_adjust {
            self.adjusted(base, &bars, price)
        } else {
            base.clone()
        };

        Ok(Inputs {
            price,
            bars: bars.len(),
            snapshot,
            config,
        })
    }

    fn adjusted(&self, base: &SymbolConfig, bars: &[OhlcvBar], price: f64) -> SymbolConfig {
        match volatility::market_volatility(bars, base.indicators.atr_window, price) {
            Some(vol) if vol > volatility::VOLATILITY_THRESHOLD => {
                let adjusted = volatility::adjust(base, vol, price);
                info!(
                    symbol = %base.symbol,
                    volatility = vol,
                    buy_price = adjusted.buy_price,
                    sell_price = adjusted.sell_price,
                    "volatility adjustment applied"
                );
                adjusted
            }
            Some(vol) => {
                debug!(
                    symbol = %base.symbol,
                    volatility = vol,
                    buy_price = base.buy_price,
                    sell_price = base.sell_price,
                    "volatility low; keeping price levels"
                );
                base.clone()
            }
            None => base.clone(),
        }
    }

    fn execute_buy(
        &mut self,
        symbol: &str,
        price: f64,
        config: &SymbolConfig,
    ) -> Result<TradeEvent, SignalError> {
        let receipt = self
            .execution
            .submit_order(symbol, OrderSide::Buy, config.amount, OrderType::Market)
            .inspect_err(|e| error!(symbol, error = %e, "buy order failed; position unchanged"))?;

        let fill = confirmed_fill(symbol, &receipt, price)?;
        let fee = buy_fee(fill, receipt.filled, config.fee_rate);
        self.store
            .open(symbol, fill, receipt.filled, fee, config.trailing_stop_pct);

        info!(
            symbol,
            price = fill,
            amount = receipt.filled,
            fee,
            order_id = %receipt.order_id,
            "bought"
        );

        Ok(TradeEvent {
            symbol: symbol.to_string(),
            action: TradeAction::Buy,
            price: fill,
            amount: receipt.filled,
            net_profit: None,
            pct: None,
            reason: None,
            timestamp: receipt.timestamp,
        })
    }

    fn execute_exit(
        &mut self,
        symbol: &str,
        price: f64,
        config: &SymbolConfig,
        position: &PositionState,
        verdict: Verdict,
    ) -> Result<TradeEvent, SignalError> {
        let held = position.amount.unwrap_or(config.amount);
        let receipt = self
            .execution
            .submit_order(symbol, OrderSide::Sell, held, OrderType::Market)
            .inspect_err(|e| error!(symbol, error = %e, "sell order failed; position unchanged"))?;
        let fill = confirmed_fill(symbol, &receipt, price)?;

        let reason = match verdict {
            Verdict::StopLoss(reason) => Some(reason),
            _ => None,
        };

        let sold = if position.holding && receipt.filled < held * (1.0 - FILL_TOLERANCE) {
            warn!(
                symbol,
                filled = receipt.filled,
                requested = held,
                order_id = %receipt.order_id,
                "partial exit fill; remainder stays open"
            );
            self.store.reduce(symbol, receipt.filled)
        } else {
            if let Some(reason) = reason {
                self.store.mark_stop_reason(symbol, reason);
            }
            self.store.close(symbol)
        };

        let amount = sold.amount.unwrap_or(receipt.filled).min(receipt.filled);
        let profit = ProfitBreakdown::compute(
            sold.entry_price.unwrap_or(fill),
            amount,
            sold.buy_fee.unwrap_or(0.0),
            fill,
            config.fee_rate,
        );

        let action = verdict.action().unwrap_or(TradeAction::Sell);
        info!(
            symbol,
            action = %action,
            price = fill,
            amount,
            net_profit = profit.net_profit,
            pct = profit.pct(),
            reason = reason.map(|r| r.as_str()),
            order_id = %receipt.order_id,
            "position closed"
        );

        Ok(TradeEvent {
            symbol: symbol.to_string(),
            action,
            price: fill,
            amount,
            net_profit: Some(profit.net_profit),
            pct: Some(profit.pct()),
            reason,
            timestamp: receipt.timestamp,
        })
    }

    fn persist(&self) -> Result<(), SignalError> {
        self.positions
            .save(self.store.positions())
            .inspect_err(|e| error!(error = %e, "failed to save positions"))
    }

    fn publish(&self, event: &TradeEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.publish(event) {
                warn!(sink = sink.name(), symbol = %event.symbol, error = %e, "event sink failed");
            }
        }
    }
}

/// Relative shortfall below which an exit fill counts as complete.
const FILL_TOLERANCE: f64 = 1e-9;

/// Fill price of a confirmed order. A receipt with nothing filled or with an
/// unusable price is treated as a rejection so the store stays untouched.
fn confirmed_fill(symbol: &str, receipt: &OrderReceipt, quote: f64) -> Result<f64, SignalError> {
    let fill = receipt.avg_price.unwrap_or(quote);
    if receipt.filled.is_finite() && receipt.filled > 0.0 && fill.is_finite() && fill > 0.0 {
        return Ok(fill);
    }
    error!(
        symbol,
        filled = receipt.filled,
        avg_price = receipt.avg_price,
        order_id = %receipt.order_id,
        "order confirmed without a usable fill; position unchanged"
    );
    Err(SignalError::OrderRejected {
        symbol: symbol.to_string(),
        reason: format!(
            "order {} reported filled {} at {:?}",
            receipt.order_id, receipt.filled, receipt.avg_price
        ),
    })
}

fn log_snapshot(symbol: &str, timeframe: &str, snapshot: &IndicatorSnapshot) {
    let last = |series: &[f64]| series.last().copied().unwrap_or(f64::NAN);
    debug!(
        symbol,
        timeframe,
        dif = last(&snapshot.dif),
        dea = last(&snapshot.dea),
        k = last(&snapshot.k),
        d = last(&snapshot.d),
        j = last(&snapshot.j),
        atr = last(&snapshot.atr),
        bar_time = ?snapshot.last_timestamp(),
        "indicator snapshot"
    );
}

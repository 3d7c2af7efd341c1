//! Deployment and per-symbol strategy configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::indicator::IndicatorParams;
use crate::domain::strategy::StrategyKind;

/// A stop-loss method, in the order it appears in `stop_loss_priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopLossMethod {
    Fixed,
    Atr,
    Macd,
    Drawdown,
    Trailing,
}

impl StopLossMethod {
    pub const ALL: [StopLossMethod; 5] = [
        StopLossMethod::Trailing,
        StopLossMethod::Fixed,
        StopLossMethod::Atr,
        StopLossMethod::Macd,
        StopLossMethod::Drawdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StopLossMethod::Fixed => "fixed",
            StopLossMethod::Atr => "atr",
            StopLossMethod::Macd => "macd",
            StopLossMethod::Drawdown => "drawdown",
            StopLossMethod::Trailing => "trailing",
        }
    }
}

impl fmt::Display for StopLossMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stop-loss method: {0}")]
pub struct UnknownStopLossMethod(pub String);

impl FromStr for StopLossMethod {
    type Err = UnknownStopLossMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(StopLossMethod::Fixed),
            "atr" => Ok(StopLossMethod::Atr),
            "macd" => Ok(StopLossMethod::Macd),
            "drawdown" => Ok(StopLossMethod::Drawdown),
            "trailing" => Ok(StopLossMethod::Trailing),
            other => Err(UnknownStopLossMethod(other.to_string())),
        }
    }
}

/// Immutable per-symbol parameters. Fractional values (`*_pct` except
/// `min_profit_pct`) are ratios: 0.02 means 2%. `min_profit_pct` is a percent.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolConfig {
    pub symbol: String,
    pub amount: f64,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub fee_rate: f64,
    pub take_profit_pct: f64,
    pub stop_loss_ratio: f64,
    pub indicators: IndicatorParams,
    pub max_j_buy: f64,
    pub min_j_sell: f64,
    pub fixed_stop_loss_pct: f64,
    pub atr_stop_multiplier: f64,
    pub max_drawdown_pct: f64,
    pub trailing_stop_pct: f64,
    pub min_profit_pct: f64,
    pub stop_loss_priority: Vec<StopLossMethod>,
}

impl SymbolConfig {
    pub fn new(symbol: impl Into<String>, amount: f64) -> Self {
        SymbolConfig {
            symbol: symbol.into(),
            amount,
            buy_price: None,
            sell_price: None,
            fee_rate: 0.001,
            take_profit_pct: 0.03,
            stop_loss_ratio: 0.98,
            indicators: IndicatorParams::default(),
            max_j_buy: 70.0,
            min_j_sell: 90.0,
            fixed_stop_loss_pct: 0.02,
            atr_stop_multiplier: 2.0,
            max_drawdown_pct: 0.05,
            trailing_stop_pct: 0.02,
            min_profit_pct: 1.0,
            stop_loss_priority: StopLossMethod::ALL.to_vec(),
        }
    }
}

/// Settings of the `[bot]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BotSettings {
    pub symbols: Vec<String>,
    pub strategy: StrategyKind,
    pub interval_secs: u64,
    pub dry_run: bool,
    pub timeframe: String,
    pub bar_limit: usize,
    pub data_dir: PathBuf,
    pub position_file: PathBuf,
    pub ledger_file: PathBuf,
    pub volatility_adjust: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        BotSettings {
            symbols: Vec::new(),
            strategy: StrategyKind::MacdKdj,
            interval_secs: 5,
            dry_run: true,
            timeframe: "1m".to_string(),
            bar_limit: 200,
            data_dir: PathBuf::from("data"),
            position_file: PathBuf::from("position.json"),
            ledger_file: PathBuf::from("trade_history.csv"),
            volatility_adjust: false,
        }
    }
}

/// Fully validated configuration for one deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub bot: BotSettings,
    pub symbols: Vec<SymbolConfig>,
}

impl RuntimeConfig {
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolConfig> {
        self.symbols.iter().find(|c| c.symbol == symbol)
    }
}

//! Configuration loading and validation.
//!
//! Everything a tick depends on is checked here, once, before the first tick:
//! window lengths, percentage ranges, the stop-loss priority list and the
//! symbol list. Nothing downstream re-validates.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::domain::config::{BotSettings, RuntimeConfig, StopLossMethod, SymbolConfig};
use crate::domain::error::SignalError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::strategy::StrategyKind;
use crate::domain::symbols::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub const BOT_SECTION: &str = "bot";

pub fn load_runtime_config(config: &dyn ConfigPort) -> Result<RuntimeConfig, SignalError> {
    let bot = load_bot_settings(config)?;

    let symbols = bot
        .symbols
        .iter()
        .map(|symbol| load_symbol_config(config, symbol))
        .collect::<Result<Vec<_>, _>>()?;

    for symbol in &symbols {
        validate_against_bot(&bot, symbol)?;
    }

    Ok(RuntimeConfig { bot, symbols })
}

pub fn load_bot_settings(config: &dyn ConfigPort) -> Result<BotSettings, SignalError> {
    let defaults = BotSettings::default();

    let symbols_raw = config
        .get_string(BOT_SECTION, "symbols")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| SignalError::ConfigMissing {
            section: BOT_SECTION.to_string(),
            key: "symbols".to_string(),
        })?;
    let symbols = parse_symbols(&symbols_raw)
        .map_err(|e| SignalError::invalid(BOT_SECTION, "symbols", e.to_string()))?;

    let strategy = match config.get_string(BOT_SECTION, "strategy") {
        Some(raw) => raw
            .parse::<StrategyKind>()
            .map_err(|e| SignalError::invalid(BOT_SECTION, "strategy", e))?,
        None => defaults.strategy,
    };

    let interval_secs = read_usize(config, BOT_SECTION, "interval_secs", defaults.interval_secs as usize)?;
    if interval_secs == 0 {
        return Err(SignalError::invalid(BOT_SECTION, "interval_secs", "must be at least 1"));
    }

    let timeframe = config
        .get_string(BOT_SECTION, "timeframe")
        .map(|s| s.trim().to_string())
        .unwrap_or(defaults.timeframe);
    if timeframe.is_empty() {
        return Err(SignalError::invalid(BOT_SECTION, "timeframe", "must not be empty"));
    }

    let bar_limit = read_usize(config, BOT_SECTION, "bar_limit", defaults.bar_limit)?;
    if bar_limit == 0 {
        return Err(SignalError::invalid(BOT_SECTION, "bar_limit", "must be at least 1"));
    }

    Ok(BotSettings {
        symbols,
        strategy,
        interval_secs: interval_secs as u64,
        dry_run: config.get_bool(BOT_SECTION, "dry_run", defaults.dry_run)?,
        timeframe,
        bar_limit,
        data_dir: read_path(config, "data_dir", defaults.data_dir),
        position_file: read_path(config, "position_file", defaults.position_file),
        ledger_file: read_path(config, "ledger_file", defaults.ledger_file),
        volatility_adjust: config.get_bool(BOT_SECTION, "volatility_adjust", defaults.volatility_adjust)?,
    })
}

/// Read the `[<symbol>]` section. `amount` is the only required key.
pub fn load_symbol_config(config: &dyn ConfigPort, symbol: &str) -> Result<SymbolConfig, SignalError> {
    if !config.has_section(symbol) || config.get_string(symbol, "amount").is_none() {
        return Err(SignalError::ConfigMissing {
            section: symbol.to_string(),
            key: "amount".to_string(),
        });
    }

    let d = SymbolConfig::new(symbol, 0.0);
    let p = d.indicators;

    let indicators = IndicatorParams {
        macd_fast: read_usize(config, symbol, "macd_fast", p.macd_fast)?,
        macd_slow: read_usize(config, symbol, "macd_slow", p.macd_slow)?,
        macd_signal: read_usize(config, symbol, "macd_signal", p.macd_signal)?,
        kdj_period: read_usize(config, symbol, "kdj_period", p.kdj_period)?,
        kdj_k_smooth: read_usize(config, symbol, "kdj_k_smooth", p.kdj_k_smooth)?,
        kdj_d_smooth: read_usize(config, symbol, "kdj_d_smooth", p.kdj_d_smooth)?,
        atr_window: read_usize(config, symbol, "atr_window", p.atr_window)?,
    };

    let stop_loss_priority = match config.get_string(symbol, "stop_loss_priority") {
        Some(raw) => parse_priority(symbol, &raw)?,
        None => d.stop_loss_priority,
    };

    let cfg = SymbolConfig {
        symbol: symbol.to_string(),
        amount: config.get_double(symbol, "amount", 0.0)?,
        buy_price: read_optional_price(config, symbol, "buy_price")?,
        sell_price: read_optional_price(config, symbol, "sell_price")?,
        fee_rate: config.get_double(symbol, "fee_rate", d.fee_rate)?,
        take_profit_pct: config.get_double(symbol, "take_profit_pct", d.take_profit_pct)?,
        stop_loss_ratio: config.get_double(symbol, "stop_loss_ratio", d.stop_loss_ratio)?,
        indicators,
        max_j_buy: config.get_double(symbol, "max_j_buy", d.max_j_buy)?,
        min_j_sell: config.get_double(symbol, "min_j_sell", d.min_j_sell)?,
        fixed_stop_loss_pct: config.get_double(symbol, "fixed_stop_loss_pct", d.fixed_stop_loss_pct)?,
        atr_stop_multiplier: config.get_double(symbol, "atr_stop_multiplier", d.atr_stop_multiplier)?,
        max_drawdown_pct: config.get_double(symbol, "max_drawdown_pct", d.max_drawdown_pct)?,
        trailing_stop_pct: config.get_double(symbol, "trailing_stop_pct", d.trailing_stop_pct)?,
        min_profit_pct: config.get_double(symbol, "min_profit_pct", d.min_profit_pct)?,
        stop_loss_priority,
    };

    validate_symbol_config(&cfg)?;
    Ok(cfg)
}

/// Parse an ordered stop-loss priority list. Unknown, empty and repeated
/// tags are rejected.
pub fn parse_priority(section: &str, raw: &str) -> Result<Vec<StopLossMethod>, SignalError> {
    let key = "stop_loss_priority";
    let mut methods = Vec::new();
    let mut seen = HashSet::new();

    for token in raw.split(',') {
        if token.trim().is_empty() {
            return Err(SignalError::invalid(section, key, "empty method tag"));
        }
        let method = token
            .parse::<StopLossMethod>()
            .map_err(|e| SignalError::invalid(section, key, e.to_string()))?;
        if !seen.insert(method) {
            return Err(SignalError::invalid(section, key, format!("duplicate method: {method}")));
        }
        methods.push(method);
    }

    Ok(methods)
}

pub fn validate_symbol_config(cfg: &SymbolConfig) -> Result<(), SignalError> {
    let s = cfg.symbol.as_str();
    let p = &cfg.indicators;

    if cfg.amount <= 0.0 {
        return Err(SignalError::invalid(s, "amount", "amount must be positive"));
    }
    for (key, value) in [("buy_price", cfg.buy_price), ("sell_price", cfg.sell_price)] {
        if value.is_some_and(|v| v <= 0.0) {
            return Err(SignalError::invalid(s, key, format!("{key} must be positive")));
        }
    }

    for (key, value) in [
        ("macd_fast", p.macd_fast),
        ("macd_slow", p.macd_slow),
        ("macd_signal", p.macd_signal),
        ("kdj_period", p.kdj_period),
        ("kdj_k_smooth", p.kdj_k_smooth),
        ("kdj_d_smooth", p.kdj_d_smooth),
        ("atr_window", p.atr_window),
    ] {
        if value == 0 {
            return Err(SignalError::invalid(s, key, format!("{key} must be at least 1")));
        }
    }
    if p.macd_fast >= p.macd_slow {
        return Err(SignalError::invalid(s, "macd_fast", "macd_fast must be less than macd_slow"));
    }

    if !(0.0..1.0).contains(&cfg.fee_rate) {
        return Err(SignalError::invalid(s, "fee_rate", "fee_rate must be in [0, 1)"));
    }
    for (key, value) in [
        ("fixed_stop_loss_pct", cfg.fixed_stop_loss_pct),
        ("max_drawdown_pct", cfg.max_drawdown_pct),
        ("trailing_stop_pct", cfg.trailing_stop_pct),
    ] {
        if value <= 0.0 || value >= 1.0 {
            return Err(SignalError::invalid(s, key, format!("{key} must be in (0, 1)")));
        }
    }
    if cfg.stop_loss_ratio <= 0.0 || cfg.stop_loss_ratio > 1.0 {
        return Err(SignalError::invalid(s, "stop_loss_ratio", "stop_loss_ratio must be in (0, 1]"));
    }
    if cfg.take_profit_pct < 0.0 {
        return Err(SignalError::invalid(s, "take_profit_pct", "take_profit_pct must be non-negative"));
    }
    if cfg.min_profit_pct < 0.0 {
        return Err(SignalError::invalid(s, "min_profit_pct", "min_profit_pct must be non-negative"));
    }
    if cfg.atr_stop_multiplier <= 0.0 {
        return Err(SignalError::invalid(s, "atr_stop_multiplier", "atr_stop_multiplier must be positive"));
    }

    if cfg.stop_loss_priority.is_empty() {
        return Err(SignalError::invalid(s, "stop_loss_priority", "at least one method is required"));
    }

    Ok(())
}

/// Checks that depend on both `[bot]` and a symbol section.
fn validate_against_bot(bot: &BotSettings, cfg: &SymbolConfig) -> Result<(), SignalError> {
    let s = cfg.symbol.as_str();

    if bot.strategy == StrategyKind::MacdKdj {
        let need = cfg.indicators.required_bars();
        if bot.bar_limit < need {
            return Err(SignalError::invalid(
                BOT_SECTION,
                "bar_limit",
                format!("{s} needs at least {need} bars for its indicator windows"),
            ));
        }
    }

    if bot.volatility_adjust && bot.bar_limit < cfg.indicators.atr_window {
        return Err(SignalError::invalid(
            BOT_SECTION,
            "bar_limit",
            format!("{s} needs at least {} bars for its ATR window", cfg.indicators.atr_window),
        ));
    }

    if bot.strategy == StrategyKind::Threshold && cfg.buy_price.is_none() && !bot.volatility_adjust {
        return Err(SignalError::ConfigMissing {
            section: s.to_string(),
            key: "buy_price".to_string(),
        });
    }

    Ok(())
}

fn read_usize(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> Result<usize, SignalError> {
    let value = config.get_int(section, key, default as i64)?;
    usize::try_from(value).map_err(|_| SignalError::invalid(section, key, format!("{key} must be non-negative")))
}

fn read_optional_price(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, SignalError> {
    match config.get_string(section, key) {
        Some(_) => config.get_double(section, key, 0.0).map(Some),
        None => Ok(None),
    }
}

fn read_path(config: &dyn ConfigPort, key: &str, default: PathBuf) -> PathBuf {
    config
        .get_string(BOT_SECTION, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new(pairs: &[(&str, &str, &str)]) -> Self {
            let values = pairs
                .iter()
                .map(|(s, k, v)| ((s.to_lowercase(), k.to_lowercase()), v.to_string()))
                .collect();
            MockConfig { values }
        }

        fn with(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_lowercase(), key.to_lowercase()), value.to_string());
            self
        }

        fn without(mut self, section: &str, key: &str) -> Self {
            self.values.remove(&(section.to_lowercase(), key.to_lowercase()));
            self
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_lowercase(), key.to_lowercase()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SignalError> {
            match self.get_string(section, key) {
                Some(v) => v.parse().map_err(|_| SignalError::invalid(section, key, "not an integer")),
                None => Ok(default),
            }
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SignalError> {
            match self.get_string(section, key) {
                Some(v) => v.parse().map_err(|_| SignalError::invalid(section, key, "not a number")),
                None => Ok(default),
            }
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, SignalError> {
            match self.get_string(section, key).as_deref() {
                Some("true") => Ok(true),
                Some("false") => Ok(false),
                Some(_) => Err(SignalError::invalid(section, key, "not a boolean")),
                None => Ok(default),
            }
        }

        fn has_section(&self, section: &str) -> bool {
            let wanted = section.to_lowercase();
            self.values.keys().any(|(s, _)| *s == wanted)
        }
    }

    fn valid_config() -> MockConfig {
        MockConfig::new(&[
            ("bot", "symbols", "BTC/USDT,DOGE/USDT"),
            ("bot", "strategy", "macd_kdj"),
            ("bot", "interval_secs", "5"),
            ("BTC/USDT", "amount", "0.001"),
            ("BTC/USDT", "stop_loss_priority", "fixed,trailing"),
            ("DOGE/USDT", "amount", "50"),
            ("DOGE/USDT", "buy_price", "0.15"),
        ])
    }

    fn assert_invalid(result: Result<RuntimeConfig, SignalError>, expected_key: &str) {
        match result {
            Err(SignalError::InvalidConfig { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected InvalidConfig for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_loads() {
        let rc = load_runtime_config(&valid_config()).unwrap();
        assert_eq!(rc.bot.symbols, vec!["BTC/USDT", "DOGE/USDT"]);
        assert_eq!(rc.bot.strategy, StrategyKind::MacdKdj);
        assert_eq!(rc.bot.interval_secs, 5);
        assert!(rc.bot.dry_run);
        assert_eq!(rc.bot.bar_limit, 200);

        let btc = rc.symbol("BTC/USDT").unwrap();
        assert_eq!(btc.amount, 0.001);
        assert_eq!(
            btc.stop_loss_priority,
            vec![StopLossMethod::Fixed, StopLossMethod::Trailing]
        );
        assert_eq!(btc.indicators, IndicatorParams::default());
        assert_eq!(btc.buy_price, None);

        let doge = rc.symbol("DOGE/USDT").unwrap();
        assert_eq!(doge.buy_price, Some(0.15));
        assert_eq!(doge.stop_loss_priority, StopLossMethod::ALL.to_vec());
    }

    #[test]
    fn missing_symbols_is_config_missing() {
        let cfg = valid_config().without("bot", "symbols");
        assert!(matches!(
            load_runtime_config(&cfg),
            Err(SignalError::ConfigMissing { ref key, .. }) if key == "symbols"
        ));
    }

    #[test]
    fn duplicate_symbols_rejected() {
        let cfg = valid_config().with("bot", "symbols", "BTC/USDT,btc/usdt");
        assert_invalid(load_runtime_config(&cfg), "symbols");
    }

    #[test]
    fn unknown_strategy_rejected() {
        let cfg = valid_config().with("bot", "strategy", "grid");
        assert_invalid(load_runtime_config(&cfg), "strategy");
    }

    #[test]
    fn zero_interval_rejected() {
        let cfg = valid_config().with("bot", "interval_secs", "0");
        assert_invalid(load_runtime_config(&cfg), "interval_secs");
    }

    #[test]
    fn missing_symbol_section_is_config_missing() {
        let cfg = valid_config().with("bot", "symbols", "BTC/USDT,ETH/USDT");
        assert!(matches!(
            load_runtime_config(&cfg),
            Err(SignalError::ConfigMissing { ref section, ref key }) if section == "ETH/USDT" && key == "amount"
        ));
    }

    #[test]
    fn non_positive_amount_rejected() {
        let cfg = valid_config().with("BTC/USDT", "amount", "0");
        assert_invalid(load_runtime_config(&cfg), "amount");
    }

    #[test]
    fn zero_window_rejected() {
        let cfg = valid_config().with("BTC/USDT", "kdj_period", "0");
        assert_invalid(load_runtime_config(&cfg), "kdj_period");
    }

    #[test]
    fn negative_window_rejected() {
        let cfg = valid_config().with("BTC/USDT", "atr_window", "-3");
        assert_invalid(load_runtime_config(&cfg), "atr_window");
    }

    #[test]
    fn fast_not_below_slow_rejected() {
        let cfg = valid_config()
            .with("BTC/USDT", "macd_fast", "26")
            .with("BTC/USDT", "macd_slow", "12");
        assert_invalid(load_runtime_config(&cfg), "macd_fast");
    }

    #[test]
    fn out_of_range_percentages_rejected() {
        for (key, value) in [
            ("fee_rate", "-0.001"),
            ("fixed_stop_loss_pct", "1.5"),
            ("max_drawdown_pct", "0"),
            ("trailing_stop_pct", "-0.02"),
            ("stop_loss_ratio", "1.2"),
            ("take_profit_pct", "-1"),
            ("min_profit_pct", "-0.5"),
            ("atr_stop_multiplier", "0"),
        ] {
            let cfg = valid_config().with("BTC/USDT", key, value);
            assert_invalid(load_runtime_config(&cfg), key);
        }
    }

    #[test]
    fn unknown_priority_tag_rejected() {
        let cfg = valid_config().with("BTC/USDT", "stop_loss_priority", "fixed,breakeven");
        assert_invalid(load_runtime_config(&cfg), "stop_loss_priority");
    }

    #[test]
    fn empty_priority_rejected() {
        for raw in ["", " ", "fixed,,atr"] {
            let cfg = valid_config().with("BTC/USDT", "stop_loss_priority", raw);
            assert_invalid(load_runtime_config(&cfg), "stop_loss_priority");
        }
    }

    #[test]
    fn duplicate_priority_rejected() {
        let cfg = valid_config().with("BTC/USDT", "stop_loss_priority", "atr,fixed,ATR");
        assert_invalid(load_runtime_config(&cfg), "stop_loss_priority");
    }

    #[test]
    fn priority_order_is_preserved() {
        let methods = parse_priority("X/Y", "drawdown, macd ,Trailing").unwrap();
        assert_eq!(
            methods,
            vec![StopLossMethod::Drawdown, StopLossMethod::Macd, StopLossMethod::Trailing]
        );
    }

    #[test]
    fn bar_limit_must_cover_warmup() {
        let cfg = valid_config().with("bot", "bar_limit", "34");
        assert_invalid(load_runtime_config(&cfg), "bar_limit");

        let cfg = valid_config().with("bot", "bar_limit", "35");
        assert!(load_runtime_config(&cfg).is_ok());
    }

    #[test]
    fn threshold_strategy_needs_buy_price() {
        let cfg = valid_config().with("bot", "strategy", "threshold");
        assert!(matches!(
            load_runtime_config(&cfg),
            Err(SignalError::ConfigMissing { ref section, ref key }) if section == "BTC/USDT" && key == "buy_price"
        ));

        let cfg = cfg.with("bot", "volatility_adjust", "true");
        assert!(load_runtime_config(&cfg).is_ok());
    }

    #[test]
    fn malformed_number_rejected() {
        let cfg = valid_config().with("BTC/USDT", "fee_rate", "abc");
        assert_invalid(load_runtime_config(&cfg), "fee_rate");
    }

    #[test]
    fn paths_default_and_override() {
        let rc = load_runtime_config(&valid_config()).unwrap();
        assert_eq!(rc.bot.position_file, PathBuf::from("position.json"));

        let cfg = valid_config().with("bot", "position_file", "state/pos.json");
        let rc = load_runtime_config(&cfg).unwrap();
        assert_eq!(rc.bot.position_file, PathBuf::from("state/pos.json"));
    }
}

//! CSV file market-data adapter.
//!
//! One file per symbol and timeframe: `<data_dir>/BTC-USDT_1m.csv` with the
//! header `timestamp,open,high,low,close,volume`. Timestamps are either Unix
//! milliseconds or RFC 3339. The latest price is the close of the newest bar.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbols::file_stem;
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
    price_timeframe: String,
}

impl CsvAdapter {
    /// `price_timeframe` selects the file whose last close is the latest price.
    pub fn new(base_path: PathBuf, price_timeframe: impl Into<String>) -> Self {
        Self {
            base_path,
            price_timeframe: price_timeframe.into(),
        }
    }

    pub fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", file_stem(symbol), timeframe))
    }

    fn read_bars(&self, symbol: &str, timeframe: &str) -> Result<Vec<OhlcvBar>, SignalError> {
        let unavailable = |reason: String| SignalError::FeedUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| unavailable(format!("CSV parse error: {}", e)))?;

            let field = |idx: usize, name: &str| -> Result<f64, SignalError> {
                record
                    .get(idx)
                    .ok_or_else(|| unavailable(format!("row {}: missing {} column", line + 1, name)))?
                    .trim()
                    .parse()
                    .map_err(|e| unavailable(format!("row {}: invalid {} value: {}", line + 1, name, e)))
            };

            let ts_raw = record
                .get(0)
                .ok_or_else(|| unavailable(format!("row {}: missing timestamp column", line + 1)))?;
            let timestamp = parse_timestamp(ts_raw.trim())
                .ok_or_else(|| unavailable(format!("row {}: invalid timestamp '{}'", line + 1, ts_raw)))?;

            bars.push(OhlcvBar {
                timestamp,
                open: field(1, "open")?,
                high: field(2, "high")?,
                low: field(3, "low")?,
                close: field(4, "close")?,
                volume: field(5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl MarketDataPort for CsvAdapter {
    fn latest_price(&self, symbol: &str) -> Result<f64, SignalError> {
        let bars = self.read_bars(symbol, &self.price_timeframe)?;
        bars.last()
            .map(|b| b.close)
            .ok_or_else(|| SignalError::FeedUnavailable {
                symbol: symbol.to_string(),
                reason: "no bars available".to_string(),
            })
    }

    fn bars(&self, symbol: &str, timeframe: &str, count: usize) -> Result<Vec<OhlcvBar>, SignalError> {
        let mut bars = self.read_bars(symbol, timeframe)?;
        let skip = bars.len().saturating_sub(count);
        Ok(bars.split_off(skip))
    }
}

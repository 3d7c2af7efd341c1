//! Append-only CSV trade ledger.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use crate::domain::error::SignalError;
use crate::domain::verdict::TradeEvent;
use crate::ports::event_port::EventPort;

pub const LEDGER_HEADER: [&str; 8] = [
    "timestamp",
    "symbol",
    "action",
    "price",
    "amount",
    "net_profit",
    "pct",
    "reason",
];

pub struct CsvLedgerAdapter {
    path: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ledger_error(&self, e: impl std::fmt::Display) -> SignalError {
        SignalError::Persistence {
            reason: format!("trade ledger {}: {}", self.path.display(), e),
        }
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl EventPort for CsvLedgerAdapter {
    fn name(&self) -> &str {
        "csv_ledger"
    }

    fn publish(&self, event: &TradeEvent) -> Result<(), SignalError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut wtr = csv::Writer::from_writer(file);
        if needs_header {
            wtr.write_record(LEDGER_HEADER).map_err(|e| self.ledger_error(e))?;
        }
        wtr.write_record([
            event.timestamp.to_rfc3339(),
            event.symbol.clone(),
            event.action.to_string(),
            event.price.to_string(),
            event.amount.to_string(),
            optional(event.net_profit),
            optional(event.pct),
            event.reason.map(|r| r.to_string()).unwrap_or_default(),
        ])
        .map_err(|e| self.ledger_error(e))?;
        wtr.flush()?;
        Ok(())
    }
}

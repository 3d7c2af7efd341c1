//! Notification sink that writes trade events to the log.

use tracing::info;

use crate::domain::error::SignalError;
use crate::domain::verdict::TradeEvent;
use crate::ports::event_port::EventPort;

#[derive(Debug, Default)]
pub struct LogNotifier;

impl EventPort for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&self, event: &TradeEvent) -> Result<(), SignalError> {
        info!(
            target: "sigtrader::notify",
            symbol = %event.symbol,
            action = %event.action,
            "{event}"
        );
        Ok(())
    }
}

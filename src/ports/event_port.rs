//! Fire-and-forget sinks for trade events (notifications, trade ledger).

use crate::domain::error::SignalError;
use crate::domain::verdict::TradeEvent;

/// Sink failures are reported to the caller, which logs and carries on.
pub trait EventPort {
    fn name(&self) -> &str;
    fn publish(&self, event: &TradeEvent) -> Result<(), SignalError>;
}

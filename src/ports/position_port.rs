//! Durable storage of per-symbol position state.

use std::collections::HashMap;

use crate::domain::error::SignalError;
use crate::domain::position::PositionState;

/// Implementations must round-trip every `PositionState` field exactly,
/// including the distinction between unset and zero.
pub trait PositionPort {
    fn load(&self) -> Result<HashMap<String, PositionState>, SignalError>;
    fn save(&self, positions: &HashMap<String, PositionState>) -> Result<(), SignalError>;
}

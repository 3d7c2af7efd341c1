//! Domain error types.

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("insufficient data for {symbol}: have {have} points, need {need}")]
    InsufficientData {
        symbol: String,
        have: usize,
        need: usize,
    },

    #[error("market data unavailable for {symbol}: {reason}")]
    FeedUnavailable { symbol: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    InvalidConfig {
        section: String,
        key: String,
        reason: String,
    },

    #[error("order rejected for {symbol}: {reason}")]
    OrderRejected { symbol: String, reason: String },

    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SignalError::InvalidConfig {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors the driving loop recovers from by skipping the symbol for one tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SignalError::InsufficientData { .. }
                | SignalError::FeedUnavailable { .. }
                | SignalError::OrderRejected { .. }
        )
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        let code: u8 = match err {
            SignalError::Io(_) | SignalError::Persistence { .. } => 1,
            SignalError::ConfigParse { .. }
            | SignalError::ConfigMissing { .. }
            | SignalError::InvalidConfig { .. } => 2,
            SignalError::FeedUnavailable { .. } => 3,
            SignalError::OrderRejected { .. } => 4,
            SignalError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

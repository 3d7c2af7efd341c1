//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_ledger_adapter;
pub mod file_config_adapter;
pub mod json_position_adapter;
pub mod log_notifier;
pub mod simulated_execution;

//! Port traits for every collaborator the core talks to.

pub mod config_port;
pub mod event_port;
pub mod execution_port;
pub mod market_data_port;
pub mod position_port;

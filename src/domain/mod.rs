//! Core domain types and logic.

pub mod config;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod ohlcv;
pub mod position;
pub mod position_store;
pub mod profit;
pub mod runner;
pub mod strategy;
pub mod symbols;
pub mod verdict;
pub mod volatility;

//! Configuration access port trait.
//!
//! Section and key lookups are case-insensitive. Typed getters return the
//! default for a missing key and `InvalidConfig` for a value that does not
//! parse.

use crate::domain::error::SignalError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SignalError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SignalError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, SignalError>;
    fn has_section(&self, section: &str) -> bool;
}

//! Error kinds returned by the forecaster and the booster planner.

use thiserror::Error;

/// Errors produced by the core computations.
///
/// Every variant is local to the call that produced it; nothing here is fatal to the host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// An interval that is negative, NaN or infinite was offered to a window.
    #[error("Invalid interval {value}: must be finite and non-negative")]
    InvalidInput { value: f64 },

    /// A booster model carries a yield, rate or cycle interval that is not positive.
    #[error("Invalid booster model: {field} = {value} must be finite and greater than zero")]
    InvalidModel { field: &'static str, value: f64 },

    /// A forecaster configuration value is out of range.
    #[error("Invalid configuration '{name}': {reason}")]
    InvalidConfig { name: &'static str, reason: String },

    /// Closing the deficit takes more uses than an `f64` count can tell apart.
    #[error("Deficit {deficit} needs more uses than can be counted exactly")]
    Uncountable { deficit: f64 },
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

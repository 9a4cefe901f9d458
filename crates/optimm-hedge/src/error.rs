//! Hedge error types.

use optimm_pricing::PricingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HedgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reference price missing for an option position.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

pub type HedgeResult<T> = Result<T, HedgeError>;

//! Pricing error types.

use optimm_core::{CoreError, InstrumentId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    /// Inputs outside the model's domain (non-positive price or volatility, NaN).
    #[error("Domain error: {0}")]
    Domain(String),

    /// Instrument is at or past expiry and must not be quoted.
    #[error("Instrument expired: {0}")]
    Expired(InstrumentId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type PricingResult<T> = Result<T, PricingError>;

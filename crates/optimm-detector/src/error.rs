//! Detector error types.

use optimm_exchange::ExchangeError;
use optimm_pricing::PricingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

pub type DetectorResult<T> = Result<T, DetectorError>;

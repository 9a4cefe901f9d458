//! Error types for optimm-mm.

use optimm_core::CoreError;
use optimm_pricing::PricingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MmError {
    /// Position or parameters outside the range a policy is defined for.
    #[error("Domain error: {0}")]
    Domain(String),

    /// Unknown policy name or invalid maker parameter.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Market data outside what the quoting formulas accept, such as a
    /// non-positive mid or a negative VWAP spread.
    #[error("Market data out of range: {0}")]
    MarketData(String),

    /// Reference book missing or one-sided.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl MmError {
    /// True for conditions that only skip the current cycle.
    ///
    /// Pricing domain errors come from market inputs (configured volatility
    /// and strikes are validated at load), so they skip too. A policy
    /// `Domain` error or a bad configuration stays fatal.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable(_)
                | Self::MarketData(_)
                | Self::Pricing(PricingError::Expired(_) | PricingError::Domain(_))
        )
    }
}

pub type MmResult<T> = Result<T, MmError>;

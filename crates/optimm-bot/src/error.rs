//! Application error types.

use optimm_detector::DetectorError;
use optimm_exchange::ExchangeError;
use optimm_hedge::HedgeError;
use optimm_mm::MmError;
use optimm_pricing::PricingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] optimm_core::CoreError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Quoting error: {0}")]
    Mm(#[from] MmError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Hedge error: {0}")]
    Hedge(#[from] HedgeError),

    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] optimm_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// True when the error only skips the current cycle.
    ///
    /// Missing or out-of-range market data, exchange rejections and expired
    /// instruments are logged and the loop continues; everything else stops
    /// the engine.
    pub fn is_operational(&self) -> bool {
        match self {
            Self::Pricing(e) => is_market_driven(e),
            Self::Mm(e) => e.is_skip(),
            Self::Exchange(e) => is_transient(e),
            Self::Hedge(HedgeError::DataUnavailable(_)) => true,
            Self::Hedge(HedgeError::Pricing(e)) => is_market_driven(e),
            Self::Detector(DetectorError::DataUnavailable(_)) => true,
            Self::Detector(DetectorError::Exchange(e)) => is_transient(e),
            Self::Detector(DetectorError::Pricing(e)) => is_market_driven(e),
            _ => false,
        }
    }

    /// Short label for the skipped-cycle metric.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Pricing(PricingError::Expired(_))
            | Self::Mm(MmError::Pricing(PricingError::Expired(_)))
            | Self::Hedge(HedgeError::Pricing(PricingError::Expired(_)))
            | Self::Detector(DetectorError::Pricing(PricingError::Expired(_))) => "expired",
            Self::Exchange(ExchangeError::ExecutionRejected(_))
            | Self::Detector(DetectorError::Exchange(ExchangeError::ExecutionRejected(_))) => {
                "rejected"
            }
            Self::Mm(MmError::DataUnavailable(_))
            | Self::Exchange(ExchangeError::DataUnavailable(_))
            | Self::Hedge(HedgeError::DataUnavailable(_))
            | Self::Detector(DetectorError::DataUnavailable(_))
            | Self::Detector(DetectorError::Exchange(ExchangeError::DataUnavailable(_))) => {
                "data_unavailable"
            }
            Self::Pricing(PricingError::Domain(_))
            | Self::Mm(MmError::Pricing(PricingError::Domain(_)))
            | Self::Mm(MmError::MarketData(_))
            | Self::Hedge(HedgeError::Pricing(PricingError::Domain(_)))
            | Self::Detector(DetectorError::Pricing(PricingError::Domain(_))) => "domain",
            _ => "fatal",
        }
    }
}

/// Expiry and model-domain failures; volatility and strikes are validated
/// at load, so a domain error here traces back to a market price.
fn is_market_driven(e: &PricingError) -> bool {
    matches!(e, PricingError::Expired(_) | PricingError::Domain(_))
}

fn is_transient(e: &ExchangeError) -> bool {
    matches!(
        e,
        ExchangeError::DataUnavailable(_) | ExchangeError::ExecutionRejected(_)
    )
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use optimm_core::InstrumentId;

    #[test]
    fn test_operational_classification() {
        let expired = AppError::Mm(MmError::Pricing(PricingError::Expired(InstrumentId::from(
            "C",
        ))));
        assert!(expired.is_operational());
        assert_eq!(expired.reason(), "expired");

        let missing = AppError::Exchange(ExchangeError::DataUnavailable("book".into()));
        assert!(missing.is_operational());
        assert_eq!(missing.reason(), "data_unavailable");

        let rejected = AppError::Detector(DetectorError::Exchange(
            ExchangeError::ExecutionRejected("no".into()),
        ));
        assert!(rejected.is_operational());
        assert_eq!(rejected.reason(), "rejected");
    }

    #[test]
    fn test_bad_market_price_skips() {
        let zero = AppError::Mm(MmError::Pricing(PricingError::Domain(
            "stock value must be > 0, got 0".into(),
        )));
        assert!(zero.is_operational());
        assert_eq!(zero.reason(), "domain");

        let mid = AppError::Mm(MmError::MarketData("B: non-positive mid -0.5".into()));
        assert!(mid.is_operational());
        assert_eq!(mid.reason(), "domain");

        let delta = AppError::Hedge(HedgeError::Pricing(PricingError::Domain("nan".into())));
        assert!(delta.is_operational());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(!AppError::Config("bad".into()).is_operational());
        assert!(!AppError::Mm(MmError::Domain("p > L".into())).is_operational());
        assert!(!AppError::Exchange(ExchangeError::UnknownInstrument("Z".into())).is_operational());
        assert!(!AppError::Mm(MmError::Config("credit_mode".into())).is_operational());
        assert_eq!(AppError::Config("bad".into()).reason(), "fatal");
    }
}

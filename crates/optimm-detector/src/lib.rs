//! Arbitrage between an illiquid primal instrument and a liquid hedge.
//!
//! Detection compares the primal's touch against the hedge's touch scaled
//! by the carry factor. Execution sends the primal IOC first and hedges
//! only the volume it actually filled.

pub mod config;
pub mod detector;
pub mod error;
pub mod executor;
pub mod signal;

pub use config::{ArbPairConfig, ArbitrageConfig};
pub use detector::{ArbPair, ArbitrageDetector};
pub use error::{DetectorError, DetectorResult};
pub use executor::{detect_and_trade, execute, ArbOutcome};
pub use signal::ArbSignal;

//! Delta hedging.
//!
//! Sums the delta exposure of every non-hedge position and sizes a single
//! IOC order in the hedge instrument that brings its position to the
//! negated delta, clamped to the position limit.

pub mod config;
pub mod error;
pub mod hedger;

pub use config::HedgeConfig;
pub use error::{HedgeError, HedgeResult};
pub use hedger::{compute_delta, hedge_order, Hedger};

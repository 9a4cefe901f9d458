//! Fair-value and delta models.
//!
//! Stateless pricing of the primal instrument from a reference price:
//! Black-Scholes for European options, `S * exp(rT)` for futures and the
//! reference price itself for spot and dual listings. All functions are
//! pure; `PricingModel` binds them to configured rate and volatility.

pub mod black_scholes;
pub mod config;
pub mod error;
pub mod model;

pub use black_scholes::{call_delta, call_value, normal_cdf, put_delta, put_value};
pub use config::PricingConfig;
pub use error::{PricingError, PricingResult};
pub use model::{
    carry_factor, delta, fair_quotes, fair_value, time_to_expiry, Contract, PricingModel,
};

//! Core domain types for the optimm quoting engine.
//!
//! This crate provides the vocabulary shared by every other crate:
//! - `Price`: exact decimal price with tick rounding
//! - `Instrument`, `InstrumentKind`: immutable instrument reference data
//! - `OrderBook`, `PriceLevel`: book snapshots and VWAP helpers
//! - `Side`, `OrderType`, `RestingOrder`, `OrderRequest`: order vocabulary
//! - `Quote`: a desired two-sided quote for one instrument

pub mod book;
pub mod decimal;
pub mod error;
pub mod instrument;
pub mod order;
pub mod quote;

pub use book::{mid_vwap, spread_vwap, vwap, OrderBook, PriceLevel};
pub use decimal::Price;
pub use error::{CoreError, Result};
pub use instrument::{Instrument, InstrumentId, InstrumentKind};
pub use order::{InsertResponse, OrderRequest, OrderType, RestingOrder, Side, Trade};
pub use quote::Quote;

/// Signed position in lots.
pub type Position = i64;

/// Order volume in lots.
pub type Volume = u64;

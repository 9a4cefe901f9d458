//! Exchange access for the quoting engine.
//!
//! - `ExchangeClient`: the operations the engine consumes from an exchange
//! - `MockExchange`: in-memory exchange for simulation and tests
//! - `SnapshotCache`: whole-snapshot publication for the background refresher
//! - `clearing`: start-up helpers that flatten orders and positions

pub mod clearing;
pub mod client;
pub mod error;
pub mod mock;
pub mod snapshot;

pub use clearing::{clear_orders, clear_positions};
pub use client::{filled_volume, position_of, DynExchange, ExchangeClient};
pub use error::{ExchangeError, ExchangeResult};
pub use mock::MockExchange;
pub use snapshot::{spawn_refresher, LiveView, MarketSnapshot, MarketView, SnapshotCache};

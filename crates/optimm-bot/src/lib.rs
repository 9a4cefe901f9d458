//! Options market-making engine.
//!
//! Wires the components into one driver:
//! - Self-quoting of configured instruments, reconciled against resting orders
//! - Delta hedging in a liquid hedge instrument
//! - Primal/hedge arbitrage
//! - Optional background market snapshots

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

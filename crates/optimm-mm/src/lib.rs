//! Inventory-aware market making.
//!
//! - Credit and volume policies selected by name from lookup tables
//! - Quote construction from a reference book through the pricing model
//! - Reconciliation of a desired quote against resting orders
//!
//! # Architecture
//!
//! ```text
//! reference book ─► PricingModel::fair_quotes ─┐
//! position ─► credit/volume policies ──────────┼─► build_quote ─► Quote
//!                                              │
//! resting orders ──────────────────────────────┴─► reconcile ─► cancels + inserts
//! ```

pub mod config;
pub mod differ;
pub mod error;
pub mod policy;
pub mod quote_engine;

pub use config::{MakerConfig, SlipperyConfig};
pub use differ::{reconcile, Reconciliation};
pub use error::{MmError, MmResult};
pub use policy::{
    credit_policy, exponential_credit, volume_policy, CreditFn, CreditPair, VolumeFn, VolumePair,
    CREDIT_POLICIES, VOLUME_POLICIES,
};
pub use quote_engine::{best_quote_credit, book_vwap_quote, build_quote, QuoteEngine};

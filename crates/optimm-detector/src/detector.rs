//! Arbitrage detection.
//!
//! - Buy primal: `primal.ask < hedge.bid * carry`
//! - Sell primal: `primal.bid > hedge.ask * carry`
//!
//! Carry is 1 for dual listings and `exp(rT)` for a future against its spot.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use optimm_core::{Instrument, OrderBook, Side};
use optimm_pricing::PricingModel;

use crate::config::{ArbPairConfig, ArbitrageConfig};
use crate::error::{DetectorError, DetectorResult};
use crate::signal::ArbSignal;

/// A resolved primal/hedge pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbPair {
    pub primal: Instrument,
    pub hedge: Instrument,
}

impl ArbPair {
    /// Look both legs up in the instrument list.
    pub fn resolve(config: &ArbPairConfig, instruments: &[Instrument]) -> DetectorResult<Self> {
        let find = |id: &str| {
            instruments
                .iter()
                .find(|i| i.id.as_str() == id)
                .cloned()
                .ok_or_else(|| DetectorError::ConfigError(format!("unknown instrument {id}")))
        };
        Ok(Self {
            primal: find(&config.primal)?,
            hedge: find(&config.hedge)?,
        })
    }

    /// Carry between the legs at `now`.
    ///
    /// Non-trivial only when the primal is dated and priced off the hedge.
    pub fn carry_factor(&self, model: &PricingModel, now: DateTime<Utc>) -> DetectorResult<f64> {
        if self.primal.base_instrument_id.as_ref() == Some(&self.hedge.id) {
            Ok(model.carry_factor(&self.primal, now)?)
        } else {
            Ok(1.0)
        }
    }
}

/// Arbitrage detector.
#[derive(Debug, Clone)]
pub struct ArbitrageDetector {
    config: ArbitrageConfig,
}

impl ArbitrageDetector {
    pub fn new(config: ArbitrageConfig) -> DetectorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ArbitrageConfig {
        &self.config
    }

    /// Check a pair for an opportunity.
    ///
    /// Returns `None` when either book is one-sided or no inequality holds.
    pub fn detect(
        &self,
        pair: &ArbPair,
        carry_factor: f64,
        primal_book: &OrderBook,
        hedge_book: &OrderBook,
        now: DateTime<Utc>,
    ) -> DetectorResult<Option<ArbSignal>> {
        let (Some((p_bid, p_ask)), Some((h_bid, h_ask))) = (primal_book.top(), hedge_book.top())
        else {
            debug!(primal = %pair.primal.id, hedge = %pair.hedge.id, "book one-sided, no arbitrage check");
            return Ok(None);
        };
        let carry = Decimal::from_f64(carry_factor).ok_or_else(|| {
            DetectorError::InvalidState(format!("carry factor not representable: {carry_factor}"))
        })?;

        let (side, primal, hedge) = if p_ask.price < h_bid.price * carry {
            (Side::Bid, p_ask, h_bid)
        } else if p_bid.price > h_ask.price * carry {
            (Side::Ask, p_bid, h_ask)
        } else {
            return Ok(None);
        };

        let volume = primal.volume.min(hedge.volume);
        if volume == 0 {
            return Ok(None);
        }
        info!(
            primal = %pair.primal.id,
            hedge = %pair.hedge.id,
            side = %side,
            primal_price = %primal.price,
            hedge_price = %hedge.price,
            carry = carry_factor,
            volume,
            "Arbitrage detected"
        );
        Ok(Some(ArbSignal {
            primal: pair.primal.id.clone(),
            hedge: pair.hedge.id.clone(),
            primal_side: side,
            primal_price: primal.price,
            hedge_price: hedge.price,
            volume,
            carry_factor,
            detected_at: now,
        }))
    }
}

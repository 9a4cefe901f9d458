//! Desired two-sided quote.

use serde::Serialize;

use crate::decimal::Price;
use crate::instrument::InstrumentId;
use crate::order::{OrderRequest, Side};
use crate::Volume;

/// Bid and ask the engine wants resting for one instrument.
///
/// Recomputed every cycle and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub instrument_id: InstrumentId,
    pub bid_price: Price,
    pub bid_volume: Volume,
    pub ask_price: Price,
    pub ask_volume: Volume,
}

impl Quote {
    pub fn price(&self, side: Side) -> Price {
        match side {
            Side::Bid => self.bid_price,
            Side::Ask => self.ask_price,
        }
    }

    pub fn volume(&self, side: Side) -> Volume {
        match side {
            Side::Bid => self.bid_volume,
            Side::Ask => self.ask_volume,
        }
    }

    /// Bid at or above ask.
    pub fn is_crossed(&self) -> bool {
        self.bid_price >= self.ask_price
    }

    /// A leg is submittable when both its volume and price are positive.
    pub fn is_active(&self, side: Side) -> bool {
        self.volume(side) > 0 && self.price(side).is_positive()
    }

    /// Limit orders for the submittable legs, bid first.
    pub fn orders(&self) -> Vec<OrderRequest> {
        [Side::Bid, Side::Ask]
            .into_iter()
            .filter(|side| self.is_active(*side))
            .map(|side| {
                OrderRequest::limit(
                    self.instrument_id.clone(),
                    side,
                    self.price(side),
                    self.volume(side),
                )
            })
            .collect()
    }
}

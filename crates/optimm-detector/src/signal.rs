//! Arbitrage signal types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use optimm_core::{InstrumentId, OrderRequest, Price, Side, Volume};

/// A detected primal/hedge opportunity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbSignal {
    pub primal: InstrumentId,
    pub hedge: InstrumentId,
    /// Side of the primal leg; the hedge trades the opposite side.
    pub primal_side: Side,
    /// Primal touch we trade against (ask when buying, bid when selling).
    pub primal_price: Price,
    /// Hedge touch we trade against.
    pub hedge_price: Price,
    /// Smaller of the two touch volumes.
    pub volume: Volume,
    pub carry_factor: f64,
    pub detected_at: DateTime<Utc>,
}

impl ArbSignal {
    pub fn hedge_side(&self) -> Side {
        self.primal_side.opposite()
    }

    pub fn primal_order(&self) -> OrderRequest {
        OrderRequest::ioc(
            self.primal.clone(),
            self.primal_side,
            self.primal_price,
            self.volume,
        )
    }

    pub fn hedge_order(&self, volume: Volume) -> OrderRequest {
        OrderRequest::ioc(self.hedge.clone(), self.hedge_side(), self.hedge_price, volume)
    }
}

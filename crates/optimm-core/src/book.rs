//! Order book snapshots and volume-weighted price helpers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Price;
use crate::error::{CoreError, Result};
use crate::instrument::InstrumentId;
use crate::Volume;

/// One price level of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub volume: Volume,
}

impl PriceLevel {
    pub fn new(price: Price, volume: Volume) -> Self {
        Self { price, volume }
    }
}

/// Last-price book of one instrument.
///
/// Bids are sorted by price descending, asks ascending. Either side may be
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub instrument_id: InstrumentId,
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
}

impl OrderBook {
    /// Build a book, sorting both sides into touch-first order.
    pub fn new(
        instrument_id: InstrumentId,
        mut bids: Vec<PriceLevel>,
        mut asks: Vec<PriceLevel>,
    ) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self {
            instrument_id,
            bids,
            asks,
        }
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Best bid and best ask, if both sides are present.
    pub fn top(&self) -> Option<(PriceLevel, PriceLevel)> {
        Some((*self.best_bid()?, *self.best_ask()?))
    }

    pub fn is_two_sided(&self) -> bool {
        self.top().is_some()
    }
}

/// Volume-weighted average price of a set of levels.
///
/// Fails on an empty set or zero total volume.
pub fn vwap(levels: &[PriceLevel]) -> Result<Price> {
    let total: Volume = levels.iter().map(|l| l.volume).sum();
    if total == 0 {
        return Err(CoreError::EmptyLevels("vwap of zero volume".to_string()));
    }
    let notional: Decimal = levels
        .iter()
        .map(|l| l.price.inner() * Decimal::from(l.volume))
        .sum();
    Ok(Price::new(notional / Decimal::from(total)))
}

/// Midpoint of the bid and ask VWAPs.
pub fn mid_vwap(book: &OrderBook) -> Result<Price> {
    let bid = vwap(&book.bids)?;
    let ask = vwap(&book.asks)?;
    Ok(Price::new((bid.inner() + ask.inner()) / Decimal::TWO))
}

/// Distance between the ask VWAP and the bid VWAP.
pub fn spread_vwap(book: &OrderBook) -> Result<Price> {
    Ok(vwap(&book.asks)? - vwap(&book.bids)?)
}

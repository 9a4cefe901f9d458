//! Order-related types.
//!
//! Sides are named from the book's point of view: a `Bid` buys, an `Ask`
//! sells.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::Price;
use crate::error::Result;
use crate::instrument::InstrumentId;
use crate::{Position, Volume};

/// Book side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }

    /// Returns 1 for bid, -1 for ask (for position calculations).
    pub fn sign(&self) -> i64 {
        match self {
            Self::Bid => 1,
            Self::Ask => -1,
        }
    }

    /// Round a price away from the touch: down for bids, up for asks.
    pub fn round_price(&self, price: Price, tick_size: Price) -> Price {
        match self {
            Self::Bid => price.round_down_to_tick(tick_size),
            Self::Ask => price.round_up_to_tick(tick_size),
        }
    }

    /// Tick index of a price, rounded the same way as `round_price`.
    pub fn tick_index(&self, price: Price, tick_size: Price) -> Result<i64> {
        match self {
            Self::Bid => price.floor_ticks(tick_size),
            Self::Ask => price.ceil_ticks(tick_size),
        }
    }

    /// True if an order of `volume` on this side would push `position`
    /// beyond `limit` in absolute value.
    pub fn would_breach(&self, position: Position, volume: Volume, limit: Position) -> bool {
        let after = position + self.sign() * volume as i64;
        after.abs() > limit
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "bid"),
            Self::Ask => write!(f, "ask"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Resting limit order.
    #[default]
    Limit,
    /// Immediate-or-cancel: fills what it can, remainder is discarded.
    Ioc,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Ioc => write!(f, "ioc"),
        }
    }
}

/// An order the engine wants to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub instrument_id: InstrumentId,
    pub price: Price,
    pub volume: Volume,
    pub side: Side,
    pub order_type: OrderType,
}

impl OrderRequest {
    #[must_use]
    pub fn limit(instrument_id: InstrumentId, side: Side, price: Price, volume: Volume) -> Self {
        Self {
            instrument_id,
            price,
            volume,
            side,
            order_type: OrderType::Limit,
        }
    }

    #[must_use]
    pub fn ioc(instrument_id: InstrumentId, side: Side, price: Price, volume: Volume) -> Self {
        Self {
            instrument_id,
            price,
            volume,
            side,
            order_type: OrderType::Ioc,
        }
    }
}

/// An order currently resting on the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub order_id: u64,
    pub instrument_id: InstrumentId,
    pub price: Price,
    pub volume: Volume,
    pub side: Side,
    pub order_type: OrderType,
}

/// Exchange acknowledgement of an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertResponse {
    pub success: bool,
    pub order_id: Option<u64>,
    pub error_reason: Option<String>,
}

impl InsertResponse {
    #[must_use]
    pub fn accepted(order_id: u64) -> Self {
        Self {
            success: true,
            order_id: Some(order_id),
            error_reason: None,
        }
    }

    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            order_id: None,
            error_reason: Some(reason.into()),
        }
    }
}

/// A fill of one of our orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub order_id: u64,
    pub instrument_id: InstrumentId,
    pub price: Price,
    pub volume: Volume,
    pub side: Side,
}

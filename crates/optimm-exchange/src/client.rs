//! Exchange client trait.
//!
//! Synchronous request/response operations. Implementations must be safe to
//! share between the strategy loops and the snapshot refresher.

use std::collections::HashMap;
use std::sync::Arc;

use optimm_core::{
    InsertResponse, Instrument, InstrumentId, OrderBook, OrderRequest, Position, RestingOrder,
    Trade, Volume,
};

use crate::error::ExchangeResult;

pub trait ExchangeClient: Send + Sync {
    fn get_instruments(&self) -> ExchangeResult<Vec<Instrument>>;

    /// Latest book of an instrument, `None` if the exchange has none yet.
    fn get_last_price_book(&self, instrument_id: &InstrumentId) -> ExchangeResult<Option<OrderBook>>;

    fn get_positions(&self) -> ExchangeResult<HashMap<InstrumentId, Position>>;

    fn get_outstanding_orders(&self, instrument_id: &InstrumentId)
        -> ExchangeResult<Vec<RestingOrder>>;

    /// Fills since the previous call for this instrument.
    fn poll_new_trades(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<Trade>>;

    /// Every fill for this instrument, oldest first.
    fn get_trade_history(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<Trade>>;

    fn insert_order(&self, order: &OrderRequest) -> ExchangeResult<InsertResponse>;

    fn delete_order(&self, instrument_id: &InstrumentId, order_id: u64) -> ExchangeResult<()>;

    /// Cancel every outstanding order of an instrument.
    fn delete_orders(&self, instrument_id: &InstrumentId) -> ExchangeResult<()>;
}

/// Arc wrapper for ExchangeClient trait objects.
pub type DynExchange = Arc<dyn ExchangeClient>;

/// Position of one instrument, zero when absent.
pub fn position_of(
    positions: &HashMap<InstrumentId, Position>,
    instrument_id: &InstrumentId,
) -> Position {
    positions.get(instrument_id).copied().unwrap_or(0)
}

/// Total volume filled for `order_id`, from the instrument's trade history.
pub fn filled_volume(
    client: &dyn ExchangeClient,
    instrument_id: &InstrumentId,
    order_id: u64,
) -> ExchangeResult<Volume> {
    Ok(client
        .get_trade_history(instrument_id)?
        .iter()
        .filter(|t| t.order_id == order_id)
        .map(|t| t.volume)
        .sum())
}

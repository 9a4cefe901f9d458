//! In-memory exchange.
//!
//! Holds books, positions and our resting orders. IOC orders trade against
//! the stored book levels; limit orders rest until cancelled or filled by
//! `fill_resting`. Every mutation records the request so tests can assert
//! on what the engine sent.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use optimm_core::{
    InsertResponse, Instrument, InstrumentId, OrderBook, OrderRequest, OrderType, Position,
    PriceLevel, RestingOrder, Side, Trade, Volume,
};

use crate::client::ExchangeClient;
use crate::error::{ExchangeError, ExchangeResult};

#[derive(Debug, Default)]
struct State {
    instruments: Vec<Instrument>,
    books: HashMap<InstrumentId, OrderBook>,
    positions: HashMap<InstrumentId, Position>,
    orders: Vec<RestingOrder>,
    history: Vec<Trade>,
    unpolled: HashMap<InstrumentId, Vec<Trade>>,
    next_order_id: u64,
    inserts: Vec<OrderRequest>,
    cancels: Vec<u64>,
    reject_next: Option<String>,
}

impl State {
    fn instrument(&self, id: &InstrumentId) -> ExchangeResult<&Instrument> {
        self.instruments
            .iter()
            .find(|i| &i.id == id)
            .ok_or_else(|| ExchangeError::UnknownInstrument(id.to_string()))
    }

    fn record_fill(&mut self, order_id: u64, order: &OrderRequest, level_price: PriceLevel) {
        let trade = Trade {
            order_id,
            instrument_id: order.instrument_id.clone(),
            price: level_price.price,
            volume: level_price.volume,
            side: order.side,
        };
        *self
            .positions
            .entry(order.instrument_id.clone())
            .or_insert(0) += order.side.sign() * level_price.volume as i64;
        self.unpolled
            .entry(order.instrument_id.clone())
            .or_default()
            .push(trade.clone());
        self.history.push(trade);
    }

    /// Trade an IOC against the book, consuming liquidity level by level.
    fn execute_ioc(&mut self, order_id: u64, order: &OrderRequest) -> Volume {
        let Some(book) = self.books.get_mut(&order.instrument_id) else {
            return 0;
        };
        let levels = match order.side {
            Side::Bid => &mut book.asks,
            Side::Ask => &mut book.bids,
        };
        let mut remaining = order.volume;
        let mut fills = Vec::new();
        for level in levels.iter_mut() {
            let crosses = match order.side {
                Side::Bid => level.price <= order.price,
                Side::Ask => level.price >= order.price,
            };
            if remaining == 0 || !crosses {
                break;
            }
            let traded = remaining.min(level.volume);
            level.volume -= traded;
            remaining -= traded;
            fills.push(PriceLevel::new(level.price, traded));
        }
        levels.retain(|l| l.volume > 0);

        let filled = order.volume - remaining;
        for fill in fills {
            self.record_fill(order_id, order, fill);
        }
        filled
    }
}

/// In-memory exchange shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct MockExchange {
    state: Mutex<State>,
}

impl MockExchange {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self {
            state: Mutex::new(State {
                instruments,
                next_order_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Replace the book of an instrument.
    pub fn set_book(&self, book: OrderBook) {
        self.state
            .lock()
            .books
            .insert(book.instrument_id.clone(), book);
    }

    pub fn remove_book(&self, instrument_id: &InstrumentId) {
        self.state.lock().books.remove(instrument_id);
    }

    pub fn set_position(&self, instrument_id: &InstrumentId, position: Position) {
        self.state
            .lock()
            .positions
            .insert(instrument_id.clone(), position);
    }

    /// Reject the next insert with `reason`.
    pub fn reject_next(&self, reason: impl Into<String>) {
        self.state.lock().reject_next = Some(reason.into());
    }

    /// Simulate a counterparty trading `volume` against one of our resting orders.
    pub fn fill_resting(&self, order_id: u64, volume: Volume) -> ExchangeResult<Volume> {
        let mut state = self.state.lock();
        let idx = state
            .orders
            .iter()
            .position(|o| o.order_id == order_id)
            .ok_or_else(|| ExchangeError::ExecutionRejected(format!("no order {order_id}")))?;
        let order = state.orders[idx].clone();
        let traded = volume.min(order.volume);
        let request = OrderRequest::limit(order.instrument_id, order.side, order.price, traded);
        state.record_fill(order_id, &request, PriceLevel::new(order.price, traded));
        if traded == order.volume {
            state.orders.remove(idx);
        } else {
            state.orders[idx].volume -= traded;
        }
        Ok(traded)
    }

    /// Every insert request received, in order.
    pub fn inserted(&self) -> Vec<OrderRequest> {
        self.state.lock().inserts.clone()
    }

    /// Ids of every cancelled order, in order.
    pub fn cancelled(&self) -> Vec<u64> {
        self.state.lock().cancels.clone()
    }

    pub fn resting(&self) -> Vec<RestingOrder> {
        self.state.lock().orders.clone()
    }

    pub fn position(&self, instrument_id: &InstrumentId) -> Position {
        self.state
            .lock()
            .positions
            .get(instrument_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn clear_records(&self) {
        let mut state = self.state.lock();
        state.inserts.clear();
        state.cancels.clear();
    }
}

impl ExchangeClient for MockExchange {
    fn get_instruments(&self) -> ExchangeResult<Vec<Instrument>> {
        Ok(self.state.lock().instruments.clone())
    }

    fn get_last_price_book(&self, instrument_id: &InstrumentId) -> ExchangeResult<Option<OrderBook>> {
        let state = self.state.lock();
        state.instrument(instrument_id)?;
        Ok(state.books.get(instrument_id).cloned())
    }

    fn get_positions(&self) -> ExchangeResult<HashMap<InstrumentId, Position>> {
        Ok(self.state.lock().positions.clone())
    }

    fn get_outstanding_orders(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<RestingOrder>> {
        Ok(self
            .state
            .lock()
            .orders
            .iter()
            .filter(|o| &o.instrument_id == instrument_id)
            .cloned()
            .collect())
    }

    fn poll_new_trades(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<Trade>> {
        Ok(self
            .state
            .lock()
            .unpolled
            .remove(instrument_id)
            .unwrap_or_default())
    }

    fn get_trade_history(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<Trade>> {
        Ok(self
            .state
            .lock()
            .history
            .iter()
            .filter(|t| &t.instrument_id == instrument_id)
            .cloned()
            .collect())
    }

    fn insert_order(&self, order: &OrderRequest) -> ExchangeResult<InsertResponse> {
        let mut state = self.state.lock();
        state.inserts.push(order.clone());
        let tick = state.instrument(&order.instrument_id)?.tick_size;

        if let Some(reason) = state.reject_next.take() {
            return Ok(InsertResponse::rejected(reason));
        }
        if order.volume == 0 {
            return Ok(InsertResponse::rejected("volume must be positive"));
        }
        if !order.price.is_positive() || order.price.round_down_to_tick(tick) != order.price {
            return Ok(InsertResponse::rejected(format!(
                "price {} not on tick grid {}",
                order.price, tick
            )));
        }

        let order_id = state.next_order_id;
        state.next_order_id += 1;
        match order.order_type {
            OrderType::Ioc => {
                let filled = state.execute_ioc(order_id, order);
                debug!(
                    instrument = %order.instrument_id,
                    order_id,
                    side = %order.side,
                    requested = order.volume,
                    filled,
                    "ioc executed"
                );
            }
            OrderType::Limit => state.orders.push(RestingOrder {
                order_id,
                instrument_id: order.instrument_id.clone(),
                price: order.price,
                volume: order.volume,
                side: order.side,
                order_type: order.order_type,
            }),
        }
        Ok(InsertResponse::accepted(order_id))
    }

    fn delete_order(&self, instrument_id: &InstrumentId, order_id: u64) -> ExchangeResult<()> {
        let mut state = self.state.lock();
        state.cancels.push(order_id);
        let before = state.orders.len();
        state
            .orders
            .retain(|o| !(o.order_id == order_id && &o.instrument_id == instrument_id));
        if state.orders.len() == before {
            return Err(ExchangeError::ExecutionRejected(format!(
                "order {order_id} not outstanding on {instrument_id}"
            )));
        }
        Ok(())
    }

    fn delete_orders(&self, instrument_id: &InstrumentId) -> ExchangeResult<()> {
        let mut state = self.state.lock();
        let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.orders)
            .into_iter()
            .partition(|o| &o.instrument_id == instrument_id);
        state.orders = kept;
        state.cancels.extend(gone.iter().map(|o| o.order_id));
        Ok(())
    }
}

//! Market snapshots and the background refresher.
//!
//! The refresher captures positions, books and outstanding orders into an
//! immutable `MarketSnapshot` and publishes it by swapping a single `Arc`,
//! so readers always see one complete snapshot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use optimm_core::{InstrumentId, OrderBook, Position, RestingOrder};

use crate::client::{DynExchange, ExchangeClient};
use crate::error::{ExchangeError, ExchangeResult};

/// Read access to market state for one strategy cycle.
pub trait MarketView {
    fn book(&self, instrument_id: &InstrumentId) -> ExchangeResult<Option<OrderBook>>;

    fn position(&self, instrument_id: &InstrumentId) -> ExchangeResult<Position>;

    fn outstanding_orders(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<RestingOrder>>;
}

/// Reads straight from the exchange.
pub struct LiveView<'a>(pub &'a dyn ExchangeClient);

impl MarketView for LiveView<'_> {
    fn book(&self, instrument_id: &InstrumentId) -> ExchangeResult<Option<OrderBook>> {
        self.0.get_last_price_book(instrument_id)
    }

    fn position(&self, instrument_id: &InstrumentId) -> ExchangeResult<Position> {
        Ok(self
            .0
            .get_positions()?
            .get(instrument_id)
            .copied()
            .unwrap_or(0))
    }

    fn outstanding_orders(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<RestingOrder>> {
        self.0.get_outstanding_orders(instrument_id)
    }
}

/// Point-in-time copy of the state the strategies read.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub taken_at: Option<DateTime<Utc>>,
    pub positions: HashMap<InstrumentId, Position>,
    pub books: HashMap<InstrumentId, OrderBook>,
    pub orders: HashMap<InstrumentId, Vec<RestingOrder>>,
}

impl MarketSnapshot {
    /// Capture the state of `instruments` from the exchange.
    pub fn capture(client: &dyn ExchangeClient, instruments: &[InstrumentId]) -> ExchangeResult<Self> {
        let positions = client.get_positions()?;
        let mut books = HashMap::with_capacity(instruments.len());
        let mut orders = HashMap::with_capacity(instruments.len());
        for id in instruments {
            if let Some(book) = client.get_last_price_book(id)? {
                books.insert(id.clone(), book);
            }
            orders.insert(id.clone(), client.get_outstanding_orders(id)?);
        }
        Ok(Self {
            taken_at: Some(Utc::now()),
            positions,
            books,
            orders,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.taken_at.is_none()
    }
}

impl MarketView for MarketSnapshot {
    fn book(&self, instrument_id: &InstrumentId) -> ExchangeResult<Option<OrderBook>> {
        if self.is_empty() {
            return Err(ExchangeError::DataUnavailable("no snapshot yet".to_string()));
        }
        Ok(self.books.get(instrument_id).cloned())
    }

    fn position(&self, instrument_id: &InstrumentId) -> ExchangeResult<Position> {
        if self.is_empty() {
            return Err(ExchangeError::DataUnavailable("no snapshot yet".to_string()));
        }
        Ok(self.positions.get(instrument_id).copied().unwrap_or(0))
    }

    fn outstanding_orders(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<RestingOrder>> {
        if self.is_empty() {
            return Err(ExchangeError::DataUnavailable("no snapshot yet".to_string()));
        }
        Ok(self.orders.get(instrument_id).cloned().unwrap_or_default())
    }
}

/// Latest published snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Arc<MarketSnapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot as a whole.
    pub fn publish(&self, snapshot: MarketSnapshot) {
        *self.current.write() = Arc::new(snapshot);
    }

    /// The most recently published snapshot.
    pub fn load(&self) -> Arc<MarketSnapshot> {
        Arc::clone(&self.current.read())
    }
}

/// Refresh `cache` from `client` every `interval` until the task is aborted.
pub fn spawn_refresher(
    client: DynExchange,
    cache: Arc<SnapshotCache>,
    instruments: Vec<InstrumentId>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match MarketSnapshot::capture(client.as_ref(), &instruments) {
                Ok(snapshot) => {
                    debug!(books = snapshot.books.len(), "published market snapshot");
                    cache.publish(snapshot);
                }
                Err(e) => warn!(error = %e, "market snapshot refresh failed"),
            }
            tokio::time::sleep(interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExchange;
    use optimm_core::{Instrument, Price, PriceLevel};
    use rust_decimal_macros::dec;

    fn exchange() -> Arc<MockExchange> {
        let a = Instrument::spot("A", Price::new(dec!(0.1)));
        let ex = Arc::new(MockExchange::new(vec![a.clone()]));
        ex.set_book(OrderBook::new(
            a.id.clone(),
            vec![PriceLevel::new(Price::new(dec!(10)), 1)],
            vec![PriceLevel::new(Price::new(dec!(11)), 1)],
        ));
        ex.set_position(&a.id, 4);
        ex
    }

    #[test]
    fn test_empty_cache_is_unavailable() {
        let cache = SnapshotCache::new();
        let snap = cache.load();
        assert!(matches!(
            snap.book(&InstrumentId::from("A")),
            Err(ExchangeError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_capture_and_publish() {
        let ex = exchange();
        let cache = SnapshotCache::new();
        let id = InstrumentId::from("A");

        let held = cache.load();
        cache.publish(MarketSnapshot::capture(ex.as_ref(), &[id.clone()]).unwrap());

        // readers holding the old Arc keep a consistent view
        assert!(held.is_empty());
        let snap = cache.load();
        assert_eq!(snap.position(&id).unwrap(), 4);
        assert!(snap.book(&id).unwrap().is_some());
        assert!(snap.outstanding_orders(&id).unwrap().is_empty());
    }

    #[test]
    fn test_live_view() {
        let ex = exchange();
        let view = LiveView(ex.as_ref());
        let id = InstrumentId::from("A");
        assert_eq!(view.position(&id).unwrap(), 4);
        assert_eq!(view.position(&InstrumentId::from("Z")).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresher_publishes() {
        let ex = exchange();
        let cache = Arc::new(SnapshotCache::new());
        let handle = spawn_refresher(
            ex.clone(),
            cache.clone(),
            vec![InstrumentId::from("A")],
            Duration::from_millis(5),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let snap = cache.load();
        assert!(!snap.is_empty());
        assert_eq!(snap.position(&InstrumentId::from("A")).unwrap(), 4);
    }
}

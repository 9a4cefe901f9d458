//! Application driver.
//!
//! Runs three strategies against one exchange client:
//! 1. Quoting: price each configured instrument, diff against resting
//!    orders, cancel and insert the difference.
//! 2. Hedging: offset the book's net delta in the hedge instrument.
//! 3. Arbitrage: trade primal/hedge pairs whose books cross.
//!
//! Quoting reads either live from the exchange or from the snapshot cache;
//! hedging and arbitrage always read live.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use optimm_core::{Instrument, InstrumentId, OrderBook, Price};
use optimm_detector::{detect_and_trade, ArbOutcome, ArbPair, ArbitrageDetector};
use optimm_exchange::{
    clear_orders, clear_positions, filled_volume, position_of, spawn_refresher, DynExchange,
    ExchangeError, LiveView, MarketView, MockExchange, SnapshotCache,
};
use optimm_hedge::{compute_delta, Hedger};
use optimm_mm::{reconcile, MmError, QuoteEngine};
use optimm_pricing::PricingModel;
use optimm_telemetry::Metrics;

use crate::config::{AppConfig, QuoteSource, SimulationConfig};
use crate::error::{AppError, AppResult};

/// Build an in-memory exchange seeded from the simulation section.
pub fn simulated_exchange(sim: &SimulationConfig) -> AppResult<Arc<MockExchange>> {
    if sim.instruments.is_empty() {
        return Err(AppError::Config(
            "simulation.instruments is empty".to_string(),
        ));
    }
    let exchange = MockExchange::new(sim.instruments.clone());
    for book in &sim.books {
        exchange.set_book(book.clone());
    }
    for (id, position) in &sim.positions {
        exchange.set_position(&InstrumentId::new(id.clone()), *position);
    }
    Ok(Arc::new(exchange))
}

fn find_instrument(instruments: &[Instrument], id: &str) -> AppResult<Instrument> {
    instruments
        .iter()
        .find(|i| i.id.as_str() == id)
        .cloned()
        .ok_or_else(|| AppError::Config(format!("instrument {id} not listed on the exchange")))
}

/// Mid of the touch, if the book is two-sided.
fn touch_mid(book: &OrderBook) -> Option<Price> {
    let (bid, ask) = book.top()?;
    Some((bid.price + ask.price) / Decimal::TWO)
}

fn outcome_label(outcome: &ArbOutcome) -> &'static str {
    match outcome {
        ArbOutcome::SkippedLimit => "skipped_limit",
        ArbOutcome::PrimalRejected { .. } => "primal_rejected",
        ArbOutcome::PrimalUnfilled => "primal_unfilled",
        ArbOutcome::Hedged { .. } => "hedged",
        ArbOutcome::HedgeSkippedLimit { .. } => "hedge_skipped_limit",
        ArbOutcome::HedgeRejected { .. } => "hedge_rejected",
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    client: DynExchange,
    instruments: Vec<Instrument>,
    quoted: Vec<(Instrument, QuoteSource)>,
    engine: QuoteEngine,
    hedger: Option<Hedger>,
    detector: Option<ArbitrageDetector>,
    pairs: Vec<ArbPair>,
    snapshots: Arc<SnapshotCache>,
}

impl Application {
    /// Resolve every configured instrument against the exchange listing.
    pub fn new(config: AppConfig, client: DynExchange) -> AppResult<Self> {
        config.validate()?;
        let instruments = client.get_instruments()?;
        info!(count = instruments.len(), "Loaded instruments");

        let engine = QuoteEngine::new(
            PricingModel::new(config.pricing.clone()),
            config.maker.clone(),
        )?;

        let mut quoted = Vec::with_capacity(config.instruments.len());
        for entry in &config.instruments {
            let instrument = find_instrument(&instruments, &entry.id)?;
            config
                .maker
                .check_credit_against_tick(instrument.id.as_str(), instrument.tick_size);
            quoted.push((instrument, entry.source));
        }

        let hedger = match &config.hedge {
            Some(hedge) if hedge.enabled => {
                let instrument = find_instrument(&instruments, &hedge.hedge_instrument)?;
                Some(Hedger::new(hedge.clone(), instrument)?)
            }
            _ => None,
        };

        let (detector, pairs) = if config.arbitrage.enabled {
            let pairs = config
                .arbitrage
                .pairs
                .iter()
                .map(|pair| ArbPair::resolve(pair, &instruments))
                .collect::<Result<Vec<_>, _>>()?;
            (Some(ArbitrageDetector::new(config.arbitrage.clone())?), pairs)
        } else {
            (None, Vec::new())
        };

        info!(
            quoted = quoted.len(),
            hedging = hedger.is_some(),
            arbitrage_pairs = pairs.len(),
            snapshot_cache = config.runtime.use_snapshot_cache,
            "Application configured"
        );

        Ok(Self {
            config,
            client,
            instruments,
            quoted,
            engine,
            hedger,
            detector,
            pairs,
            snapshots: Arc::new(SnapshotCache::new()),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &DynExchange {
        &self.client
    }

    pub fn snapshots(&self) -> &Arc<SnapshotCache> {
        &self.snapshots
    }

    /// Instruments the snapshot refresher captures: every configured id plus
    /// the base instrument each quoted instrument is priced from.
    pub fn watched_ids(&self) -> Vec<InstrumentId> {
        let mut ids: Vec<InstrumentId> = self
            .config
            .watched_ids()
            .into_iter()
            .map(InstrumentId::new)
            .collect();
        ids.extend(
            self.quoted
                .iter()
                .filter_map(|(instrument, _)| instrument.base_instrument_id.clone()),
        );
        ids.sort();
        ids.dedup();
        ids
    }

    /// Cancel outstanding orders and close positions when configured.
    pub fn prepare(&self) -> AppResult<()> {
        if !self.config.runtime.clear_on_start {
            return Ok(());
        }
        let ids: Vec<InstrumentId> = self.instruments.iter().map(|i| i.id.clone()).collect();
        clear_orders(self.client.as_ref(), &ids)?;
        let closed = clear_positions(
            self.client.as_ref(),
            &self.instruments,
            self.config.runtime.clear_min_selling_price,
            self.config.runtime.clear_max_buying_price,
        )?;
        info!(instruments = closed.len(), "Start-up clearing done");
        Ok(())
    }

    /// One quoting pass over every configured instrument.
    pub fn quote_cycle(&self, now: DateTime<Utc>) -> AppResult<()> {
        let snapshot;
        let live;
        let view: &dyn MarketView = if self.config.runtime.use_snapshot_cache {
            snapshot = self.snapshots.load();
            &*snapshot
        } else {
            live = LiveView(self.client.as_ref());
            &live
        };

        for (instrument, source) in &self.quoted {
            if let Err(e) = self.quote_instrument(view, instrument, *source, now) {
                self.absorb(instrument.id.as_str(), e)?;
            }
        }
        Ok(())
    }

    fn quote_instrument(
        &self,
        view: &dyn MarketView,
        instrument: &Instrument,
        source: QuoteSource,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let id = &instrument.id;
        for trade in self.client.poll_new_trades(id)? {
            info!(
                instrument = %id,
                order_id = trade.order_id,
                side = %trade.side,
                price = %trade.price,
                volume = trade.volume,
                "Trade"
            );
        }

        let position = view.position(id)?;
        Metrics::position(id.as_str(), position);
        let own_book = view.book(id)?;

        let quote = match source {
            QuoteSource::Model => {
                let reference_id = instrument.base_instrument_id.as_ref().unwrap_or(id);
                let reference = if reference_id == id {
                    own_book.clone()
                } else {
                    view.book(reference_id)?
                };
                let reference = reference.ok_or_else(|| {
                    MmError::DataUnavailable(format!("no book for {reference_id}"))
                })?;
                self.engine
                    .quote(instrument, &reference, own_book.as_ref(), position, now)?
            }
            QuoteSource::BookVwap => {
                let book = own_book
                    .ok_or_else(|| MmError::DataUnavailable(format!("no book for {id}")))?;
                self.engine.quote_from_book(instrument, &book, position)?
            }
        };
        if quote.is_crossed() {
            Metrics::crossed_quote(id.as_str());
        }
        Metrics::quote_price(id.as_str(), "bid", quote.bid_price.to_f64());
        Metrics::quote_price(id.as_str(), "ask", quote.ask_price.to_f64());

        let resting = view.outstanding_orders(id)?;
        let plan = reconcile(
            &quote,
            &resting,
            instrument.tick_size,
            self.config.maker.amend_volume_drift_pct,
        )?;
        if plan.is_empty() {
            debug!(instrument = %id, position, "Quote unchanged");
            return Ok(());
        }

        for order_id in &plan.cancels {
            match self.client.delete_order(id, *order_id) {
                Ok(()) => {
                    info!(instrument = %id, order_id, "Cancelled order");
                    Metrics::order_cancelled(id.as_str());
                }
                Err(ExchangeError::ExecutionRejected(reason)) => {
                    warn!(instrument = %id, order_id, reason = %reason, "Cancel rejected");
                    Metrics::order_rejected(id.as_str(), "cancel");
                }
                Err(e) => return Err(e.into()),
            }
        }

        for order in &plan.inserts {
            let response = self.client.insert_order(order)?;
            let side = order.side.to_string();
            match response.order_id {
                Some(order_id) if response.success => {
                    info!(
                        instrument = %id,
                        order_id,
                        side = %order.side,
                        price = %order.price,
                        volume = order.volume,
                        position,
                        "Inserted quote order"
                    );
                    Metrics::order_inserted(id.as_str(), &side, "quote");
                }
                _ => {
                    warn!(
                        instrument = %id,
                        side = %order.side,
                        price = %order.price,
                        volume = order.volume,
                        reason = response.error_reason.as_deref().unwrap_or("unknown"),
                        "Quote order rejected"
                    );
                    Metrics::order_rejected(id.as_str(), &side);
                }
            }
        }
        Ok(())
    }

    /// Offset net delta in the hedge instrument.
    pub fn hedge_cycle(&self, now: DateTime<Utc>) -> AppResult<()> {
        let Some(hedger) = &self.hedger else {
            return Ok(());
        };
        self.hedge_once(hedger, now)
            .or_else(|e| self.absorb(hedger.hedge_instrument().id.as_str(), e))
    }

    fn hedge_once(&self, hedger: &Hedger, now: DateTime<Utc>) -> AppResult<()> {
        let hedge_id = &hedger.hedge_instrument().id;
        let positions = self.client.get_positions()?;

        let mut reference_ids: Vec<&InstrumentId> = self
            .instruments
            .iter()
            .filter_map(|i| i.base_instrument_id.as_ref())
            .collect();
        reference_ids.push(hedge_id);
        reference_ids.sort();
        reference_ids.dedup();

        let mut reference_prices = HashMap::with_capacity(reference_ids.len());
        for id in reference_ids {
            if let Some(mid) = self.client.get_last_price_book(id)?.as_ref().and_then(touch_mid) {
                reference_prices.insert(id.clone(), mid);
            }
        }

        let total_delta = compute_delta(
            &positions,
            &self.instruments,
            &reference_prices,
            hedge_id,
            self.engine.model(),
            now,
        )?;
        Metrics::net_delta(total_delta);

        let current = position_of(&positions, hedge_id);
        let Some(order) = hedger.order_for(total_delta, current) else {
            debug!(instrument = %hedge_id, total_delta, current, "Hedge within one lot");
            return Ok(());
        };

        let response = self.client.insert_order(&order)?;
        let side = order.side.to_string();
        match response.order_id {
            Some(order_id) if response.success => {
                let filled = filled_volume(self.client.as_ref(), hedge_id, order_id)?;
                info!(
                    instrument = %hedge_id,
                    order_id,
                    side = %order.side,
                    price = %order.price,
                    volume = order.volume,
                    filled,
                    total_delta,
                    "Hedge executed"
                );
                Metrics::order_inserted(hedge_id.as_str(), &side, "hedge");
            }
            _ => {
                warn!(
                    instrument = %hedge_id,
                    side = %order.side,
                    volume = order.volume,
                    reason = response.error_reason.as_deref().unwrap_or("unknown"),
                    "Hedge order rejected"
                );
                Metrics::order_rejected(hedge_id.as_str(), &side);
            }
        }
        Ok(())
    }

    /// Check every pair once and trade what crosses.
    pub fn arbitrage_cycle(&self, now: DateTime<Utc>) -> AppResult<Vec<ArbOutcome>> {
        let Some(detector) = &self.detector else {
            return Ok(Vec::new());
        };
        let mut outcomes = Vec::new();
        for pair in &self.pairs {
            match detect_and_trade(self.client.as_ref(), detector, pair, self.engine.model(), now)
            {
                Ok(Some(outcome)) => {
                    Metrics::arb_outcome(pair.primal.id.as_str(), outcome_label(&outcome));
                    outcomes.push(outcome);
                }
                Ok(None) => {}
                Err(e) => self.absorb(pair.primal.id.as_str(), e.into())?,
            }
        }
        Ok(outcomes)
    }

    /// Log and count a skip, or hand a fatal error back.
    fn absorb(&self, instrument: &str, e: AppError) -> AppResult<()> {
        if e.is_operational() {
            warn!(instrument, reason = e.reason(), error = %e, "Cycle skipped");
            Metrics::cycle_skipped(instrument, e.reason());
            Ok(())
        } else {
            error!(instrument, error = %e, "Fatal error");
            Err(e)
        }
    }

    /// Run until the iteration limit, Ctrl-C or a fatal error.
    pub async fn run(self) -> AppResult<()> {
        self.prepare()?;

        let runtime = self.config.runtime.clone();
        let refresher = runtime.use_snapshot_cache.then(|| {
            spawn_refresher(
                Arc::clone(&self.client),
                Arc::clone(&self.snapshots),
                self.watched_ids(),
                Duration::from_millis(runtime.snapshot_interval_ms),
            )
        });

        let mut quote_interval =
            tokio::time::interval(Duration::from_millis(runtime.quote_interval_ms));
        let mut hedge_interval =
            tokio::time::interval(Duration::from_millis(runtime.hedge_interval_ms));
        let mut cycles: u64 = 0;

        info!(iterations = ?runtime.iterations, "Entering main loop");
        let result = loop {
            tokio::select! {
                _ = quote_interval.tick() => {
                    if let Err(e) = self.quote_cycle(Utc::now()) {
                        break Err(e);
                    }
                    cycles += 1;
                    if runtime.iterations.is_some_and(|limit| cycles >= limit) {
                        info!(cycles, "Iteration limit reached");
                        break Ok(());
                    }
                }
                _ = hedge_interval.tick() => {
                    let now = Utc::now();
                    if let Err(e) = self.hedge_cycle(now) {
                        break Err(e);
                    }
                    if let Err(e) = self.arbitrage_cycle(now) {
                        break Err(e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
            }
        };

        if let Some(handle) = refresher {
            handle.abort();
        }
        info!(cycles, "Application stopped");
        result
    }
}

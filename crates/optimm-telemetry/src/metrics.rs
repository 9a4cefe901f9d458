//! Prometheus metrics for the quoting engine.
//!
//! # Panics
//!
//! Registration unwraps: a failure means duplicate metric names, which is a
//! programming error and surfaces on first use at start-up.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Encoder, Gauge,
    GaugeVec, TextEncoder,
};

use crate::error::TelemetryResult;

/// Orders accepted by the exchange.
/// Labels: instrument, side, kind (quote/hedge/arb)
pub static ORDERS_INSERTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "optimm_orders_inserted_total",
        "Orders accepted by the exchange",
        &["instrument", "side", "kind"]
    )
    .unwrap()
});

pub static ORDERS_CANCELLED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "optimm_orders_cancelled_total",
        "Resting orders cancelled by reconciliation",
        &["instrument"]
    )
    .unwrap()
});

pub static ORDERS_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "optimm_orders_rejected_total",
        "Orders or cancels refused by the exchange",
        &["instrument", "side"]
    )
    .unwrap()
});

/// Quoting cycles skipped.
/// Labels: instrument, reason (data_unavailable/expired/domain)
pub static CYCLES_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "optimm_cycles_skipped_total",
        "Quoting cycles skipped for an instrument",
        &["instrument", "reason"]
    )
    .unwrap()
});

pub static CROSSED_QUOTES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "optimm_crossed_quotes_total",
        "Self-quotes with bid at or above ask",
        &["instrument"]
    )
    .unwrap()
});

pub static ARB_OUTCOMES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "optimm_arb_outcomes_total",
        "Arbitrage signals by outcome",
        &["primal", "outcome"]
    )
    .unwrap()
});

pub static QUOTE_PRICE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "optimm_quote_price",
        "Last desired quote price",
        &["instrument", "side"]
    )
    .unwrap()
});

pub static POSITION: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("optimm_position", "Position in lots", &["instrument"]).unwrap()
});

pub static NET_DELTA: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("optimm_net_delta", "Net delta excluding the hedge instrument").unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn order_inserted(instrument: &str, side: &str, kind: &str) {
        ORDERS_INSERTED_TOTAL
            .with_label_values(&[instrument, side, kind])
            .inc();
    }

    pub fn order_cancelled(instrument: &str) {
        ORDERS_CANCELLED_TOTAL.with_label_values(&[instrument]).inc();
    }

    pub fn order_rejected(instrument: &str, side: &str) {
        ORDERS_REJECTED_TOTAL
            .with_label_values(&[instrument, side])
            .inc();
    }

    pub fn cycle_skipped(instrument: &str, reason: &str) {
        CYCLES_SKIPPED_TOTAL
            .with_label_values(&[instrument, reason])
            .inc();
    }

    pub fn crossed_quote(instrument: &str) {
        CROSSED_QUOTES_TOTAL.with_label_values(&[instrument]).inc();
    }

    pub fn arb_outcome(primal: &str, outcome: &str) {
        ARB_OUTCOMES_TOTAL
            .with_label_values(&[primal, outcome])
            .inc();
    }

    pub fn quote_price(instrument: &str, side: &str, price: f64) {
        QUOTE_PRICE.with_label_values(&[instrument, side]).set(price);
    }

    pub fn position(instrument: &str, position: i64) {
        POSITION
            .with_label_values(&[instrument])
            .set(position as f64);
    }

    pub fn net_delta(delta: f64) {
        NET_DELTA.set(delta);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

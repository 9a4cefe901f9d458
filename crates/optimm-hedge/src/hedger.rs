//! Delta aggregation and hedge sizing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use optimm_core::{Instrument, InstrumentId, OrderRequest, Position, Price, Side, Volume};
use optimm_pricing::{PricingError, PricingModel};

use crate::config::HedgeConfig;
use crate::error::{HedgeError, HedgeResult};

/// Net delta of all positions except the hedge instrument's own.
///
/// Spot and futures contribute their position. Options contribute
/// `position * delta` at the reference price of their base instrument.
/// Expired instruments contribute nothing.
pub fn compute_delta(
    positions: &HashMap<InstrumentId, Position>,
    instruments: &[Instrument],
    reference_prices: &HashMap<InstrumentId, Price>,
    hedge_instrument: &InstrumentId,
    model: &PricingModel,
    now: DateTime<Utc>,
) -> HedgeResult<f64> {
    let mut total = 0.0;
    for (id, &position) in positions {
        if id == hedge_instrument || position == 0 {
            continue;
        }
        let Some(instrument) = instruments.iter().find(|i| &i.id == id) else {
            warn!(instrument = %id, position, "position in unknown instrument ignored for delta");
            continue;
        };
        let delta = match model.contract(instrument, now) {
            Err(PricingError::Expired(_)) => {
                warn!(instrument = %id, position, "expired instrument contributes no delta");
                0.0
            }
            Err(e) => return Err(e.into()),
            Ok(contract) if contract.is_option() => {
                let base = instrument.base_instrument_id.as_ref().ok_or_else(|| {
                    HedgeError::Config(format!("option {id} has no base instrument"))
                })?;
                let price = reference_prices.get(base).copied().ok_or_else(|| {
                    HedgeError::DataUnavailable(format!("no reference price for {base}"))
                })?;
                model.delta(instrument, price, now)?
            }
            Ok(_) => 1.0,
        };
        debug!(instrument = %id, position, delta, "delta contribution");
        total += position as f64 * delta;
    }
    Ok(total)
}

/// Side and volume that move the hedge position towards `-total_delta`.
///
/// The target is clamped to `[-limit, limit]`; differences under one lot
/// are not traded.
pub fn hedge_order(
    total_delta: f64,
    current_hedge_position: Position,
    limit: Position,
) -> Option<(Side, Volume)> {
    if !total_delta.is_finite() {
        return None;
    }
    let limit = limit as f64;
    let desired = (-total_delta).clamp(-limit, limit);
    let diff = desired - current_hedge_position as f64;
    if diff >= 1.0 {
        Some((Side::Bid, diff.floor() as Volume))
    } else if diff <= -1.0 {
        Some((Side::Ask, (-diff).floor() as Volume))
    } else {
        None
    }
}

/// Hedging for one configured hedge instrument.
#[derive(Debug, Clone)]
pub struct Hedger {
    config: HedgeConfig,
    hedge: Instrument,
}

impl Hedger {
    pub fn new(config: HedgeConfig, hedge: Instrument) -> HedgeResult<Self> {
        config.validate()?;
        if hedge.id.as_str() != config.hedge_instrument {
            return Err(HedgeError::Config(format!(
                "hedge instrument {} does not match configured {}",
                hedge.id, config.hedge_instrument
            )));
        }
        Ok(Self { config, hedge })
    }

    pub fn hedge_instrument(&self) -> &Instrument {
        &self.hedge
    }

    pub fn config(&self) -> &HedgeConfig {
        &self.config
    }

    /// IOC order that offsets `total_delta`, if one is needed.
    pub fn order_for(&self, total_delta: f64, current_hedge_position: Position) -> Option<OrderRequest> {
        let (side, volume) =
            hedge_order(total_delta, current_hedge_position, self.config.position_limit)?;
        let price = match side {
            Side::Bid => self
                .config
                .max_buying_price
                .round_down_to_tick(self.hedge.tick_size),
            Side::Ask => self
                .config
                .min_selling_price
                .round_up_to_tick(self.hedge.tick_size),
        };
        info!(
            instrument = %self.hedge.id,
            total_delta,
            current = current_hedge_position,
            side = %side,
            volume,
            "hedge order"
        );
        Some(OrderRequest::ioc(self.hedge.id.clone(), side, price, volume))
    }
}

//! Reconciliation of a desired quote against resting orders.
//!
//! Prices are compared as tick indices, never as decimals: a resting bid
//! is floored and a resting ask ceiled onto the grid before matching.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use optimm_core::{OrderRequest, Price, Quote, RestingOrder, Volume};

use crate::error::MmResult;

/// Orders to cancel and orders to insert so that the resting set matches
/// the desired quote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub cancels: Vec<u64>,
    pub inserts: Vec<OrderRequest>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.cancels.is_empty() && self.inserts.is_empty()
    }
}

struct DesiredLeg {
    order: OrderRequest,
    ticks: i64,
    matched: bool,
}

fn volume_drifted(resting: Volume, desired: Volume, max_drift_pct: Option<Decimal>) -> bool {
    let Some(pct) = max_drift_pct else {
        return false;
    };
    if desired == 0 {
        return resting != 0;
    }
    let diff = Decimal::from(resting.abs_diff(desired));
    diff / Decimal::from(desired) * dec!(100) > pct
}

/// Diff `desired` against `resting`.
///
/// Each desired leg absorbs at most one equivalent resting order. Resting
/// orders for other instruments are left alone. A resting order larger than
/// the desired leg is never kept: the leg's volume is already clamped to the
/// room left under the position limit. With `max_volume_drift_pct` set, a
/// smaller resting order further than that from the desired leg is treated
/// as unmatched too.
pub fn reconcile(
    desired: &Quote,
    resting: &[RestingOrder],
    tick_size: Price,
    max_volume_drift_pct: Option<Decimal>,
) -> MmResult<Reconciliation> {
    let mut legs = desired
        .orders()
        .into_iter()
        .map(|order| {
            let ticks = order.side.tick_index(order.price, tick_size)?;
            Ok(DesiredLeg {
                order,
                ticks,
                matched: false,
            })
        })
        .collect::<MmResult<Vec<_>>>()?;

    let mut result = Reconciliation::default();
    for order in resting
        .iter()
        .filter(|o| o.instrument_id == desired.instrument_id)
    {
        let ticks = order.side.tick_index(order.price, tick_size)?;
        let hit = legs.iter_mut().find(|leg| {
            !leg.matched
                && leg.order.side == order.side
                && leg.ticks == ticks
                && order.volume <= leg.order.volume
                && !volume_drifted(order.volume, leg.order.volume, max_volume_drift_pct)
        });
        match hit {
            Some(leg) => leg.matched = true,
            None => {
                debug!(
                    instrument = %order.instrument_id,
                    order_id = order.order_id,
                    side = %order.side,
                    price = %order.price,
                    volume = order.volume,
                    "resting order no longer wanted"
                );
                result.cancels.push(order.order_id);
            }
        }
    }

    result.inserts = legs
        .into_iter()
        .filter(|leg| !leg.matched)
        .map(|leg| leg.order)
        .collect();
    Ok(result)
}

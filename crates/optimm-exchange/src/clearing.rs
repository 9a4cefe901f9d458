//! Start-up clearing of outstanding orders and open positions.

use tracing::{info, warn};

use optimm_core::{Instrument, InstrumentId, OrderRequest, Price, Side};

use crate::client::ExchangeClient;
use crate::error::ExchangeResult;

/// Cancel every outstanding order on each instrument.
pub fn clear_orders(client: &dyn ExchangeClient, instruments: &[InstrumentId]) -> ExchangeResult<()> {
    for id in instruments {
        client.delete_orders(id)?;
        info!(instrument = %id, "cleared outstanding orders");
    }
    Ok(())
}

/// Close every open position with an IOC at an extreme price.
///
/// Longs are sold at `min_selling_price`, shorts bought at
/// `max_buying_price`. Returns how many lots were closed per instrument;
/// whatever the book could not absorb stays open.
pub fn clear_positions(
    client: &dyn ExchangeClient,
    instruments: &[Instrument],
    min_selling_price: Price,
    max_buying_price: Price,
) -> ExchangeResult<Vec<(InstrumentId, u64)>> {
    let positions = client.get_positions()?;
    let mut closed = Vec::new();
    for instrument in instruments {
        let position = positions.get(&instrument.id).copied().unwrap_or(0);
        if position == 0 {
            continue;
        }
        let (side, price) = if position > 0 {
            (Side::Ask, min_selling_price.round_up_to_tick(instrument.tick_size))
        } else {
            (Side::Bid, max_buying_price.round_down_to_tick(instrument.tick_size))
        };
        let volume = position.unsigned_abs();
        let order = OrderRequest::ioc(instrument.id.clone(), side, price, volume);
        let response = client.insert_order(&order)?;
        match response.order_id {
            Some(order_id) if response.success => {
                let filled = crate::client::filled_volume(client, &instrument.id, order_id)?;
                info!(
                    instrument = %instrument.id,
                    side = %side,
                    price = %price,
                    volume,
                    filled,
                    "cleared position"
                );
                closed.push((instrument.id.clone(), filled));
            }
            _ => warn!(
                instrument = %instrument.id,
                side = %side,
                volume,
                reason = response.error_reason.as_deref().unwrap_or("unknown"),
                "position clearing order rejected"
            ),
        }
    }
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExchange;
    use optimm_core::{OrderBook, PriceLevel};
    use rust_decimal_macros::dec;

    #[test]
    fn test_clear_positions_and_orders() {
        let tick = Price::new(dec!(0.1));
        let a = Instrument::spot("A", tick);
        let b = Instrument::spot("B", tick);
        let ex = MockExchange::new(vec![a.clone(), b.clone()]);
        ex.set_book(OrderBook::new(
            a.id.clone(),
            vec![PriceLevel::new(Price::new(dec!(50)), 100)],
            vec![PriceLevel::new(Price::new(dec!(51)), 100)],
        ));
        ex.set_position(&a.id, 12);
        ex.set_position(&b.id, -3);
        ex.insert_order(&OrderRequest::limit(a.id.clone(), Side::Bid, Price::new(dec!(40)), 1))
            .unwrap();

        clear_orders(&ex, &[a.id.clone(), b.id.clone()]).unwrap();
        assert!(ex.resting().is_empty());

        let closed = clear_positions(
            &ex,
            &[a.clone(), b.clone()],
            Price::new(dec!(0.10)),
            Price::new(dec!(100000)),
        )
        .unwrap();
        // B has no book, so its IOC fills nothing
        assert_eq!(closed, vec![(a.id.clone(), 12), (b.id.clone(), 0)]);
        assert_eq!(ex.position(&a.id), 0);
        assert_eq!(ex.position(&b.id), -3);
    }
}

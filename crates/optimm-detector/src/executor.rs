//! Primal-first execution of arbitrage signals.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use optimm_core::{Position, Volume};
use optimm_exchange::{filled_volume, position_of, ExchangeClient};
use optimm_pricing::PricingModel;

use crate::detector::{ArbPair, ArbitrageDetector};
use crate::error::DetectorResult;
use crate::signal::ArbSignal;

/// What happened to a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbOutcome {
    /// One of the legs would breach its position limit; nothing was sent.
    SkippedLimit,
    PrimalRejected { reason: String },
    /// Primal IOC accepted but found no liquidity.
    PrimalUnfilled,
    Hedged {
        primal_filled: Volume,
        hedge_filled: Volume,
    },
    /// Primal filled, but hedging that volume would now breach the limit.
    HedgeSkippedLimit { primal_filled: Volume },
    HedgeRejected { primal_filled: Volume, reason: String },
}

/// Execute a signal: primal IOC, then a hedge IOC sized to the primal fill.
pub fn execute(
    client: &dyn ExchangeClient,
    signal: &ArbSignal,
    position_limit: Position,
) -> DetectorResult<ArbOutcome> {
    let positions = client.get_positions()?;
    let primal_pos = position_of(&positions, &signal.primal);
    let hedge_pos = position_of(&positions, &signal.hedge);
    if signal
        .primal_side
        .would_breach(primal_pos, signal.volume, position_limit)
        || signal
            .hedge_side()
            .would_breach(hedge_pos, signal.volume, position_limit)
    {
        info!(
            primal = %signal.primal,
            hedge = %signal.hedge,
            volume = signal.volume,
            primal_pos,
            hedge_pos,
            "arbitrage skipped, position limit"
        );
        return Ok(ArbOutcome::SkippedLimit);
    }

    let primal_order = signal.primal_order();
    let response = client.insert_order(&primal_order)?;
    let primal_id = match response.order_id {
        Some(id) if response.success => id,
        _ => {
            let reason = response
                .error_reason
                .unwrap_or_else(|| "no reason given".to_string());
            warn!(
                instrument = %signal.primal,
                side = %signal.primal_side,
                price = %signal.primal_price,
                volume = signal.volume,
                reason = %reason,
                "primal leg rejected"
            );
            return Ok(ArbOutcome::PrimalRejected { reason });
        }
    };

    let primal_filled = filled_volume(client, &signal.primal, primal_id)?;
    info!(
        instrument = %signal.primal,
        side = %signal.primal_side,
        price = %signal.primal_price,
        requested = signal.volume,
        filled = primal_filled,
        "primal leg executed"
    );
    if primal_filled == 0 {
        return Ok(ArbOutcome::PrimalUnfilled);
    }

    let hedge_pos = position_of(&client.get_positions()?, &signal.hedge);
    if signal
        .hedge_side()
        .would_breach(hedge_pos, primal_filled, position_limit)
    {
        warn!(
            instrument = %signal.hedge,
            volume = primal_filled,
            hedge_pos,
            "hedge leg skipped, position limit; primal fill left unhedged"
        );
        return Ok(ArbOutcome::HedgeSkippedLimit { primal_filled });
    }

    let hedge_order = signal.hedge_order(primal_filled);
    let response = client.insert_order(&hedge_order)?;
    match response.order_id {
        Some(hedge_id) if response.success => {
            let hedge_filled = filled_volume(client, &signal.hedge, hedge_id)?;
            info!(
                instrument = %signal.hedge,
                side = %hedge_order.side,
                price = %hedge_order.price,
                requested = primal_filled,
                filled = hedge_filled,
                "hedge leg executed"
            );
            Ok(ArbOutcome::Hedged {
                primal_filled,
                hedge_filled,
            })
        }
        _ => {
            let reason = response
                .error_reason
                .unwrap_or_else(|| "no reason given".to_string());
            warn!(
                instrument = %signal.hedge,
                volume = primal_filled,
                reason = %reason,
                "hedge leg rejected; primal fill left unhedged"
            );
            Ok(ArbOutcome::HedgeRejected {
                primal_filled,
                reason,
            })
        }
    }
}

/// Fetch both books, detect and execute in one step.
pub fn detect_and_trade(
    client: &dyn ExchangeClient,
    detector: &ArbitrageDetector,
    pair: &ArbPair,
    model: &PricingModel,
    now: DateTime<Utc>,
) -> DetectorResult<Option<ArbOutcome>> {
    let (Some(primal_book), Some(hedge_book)) = (
        client.get_last_price_book(&pair.primal.id)?,
        client.get_last_price_book(&pair.hedge.id)?,
    ) else {
        debug!(primal = %pair.primal.id, hedge = %pair.hedge.id, "no book, arbitrage skipped");
        return Ok(None);
    };
    let carry = pair.carry_factor(model, now)?;
    match detector.detect(pair, carry, &primal_book, &hedge_book, now)? {
        Some(signal) => Ok(Some(execute(
            client,
            &signal,
            detector.config().position_limit,
        )?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::TimeZone;
    use mockall::mock;
    use optimm_core::{
        InsertResponse, Instrument, InstrumentId, OrderBook, OrderRequest, Price, PriceLevel,
        RestingOrder, Side, Trade,
    };
    use optimm_exchange::ExchangeResult;
    use rust_decimal_macros::dec;

    use crate::config::ArbitrageConfig;

    mock! {
        pub Venue {}

        impl ExchangeClient for Venue {
            fn get_instruments(&self) -> ExchangeResult<Vec<Instrument>>;
            fn get_last_price_book(&self, instrument_id: &InstrumentId) -> ExchangeResult<Option<OrderBook>>;
            fn get_positions(&self) -> ExchangeResult<HashMap<InstrumentId, Position>>;
            fn get_outstanding_orders(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<RestingOrder>>;
            fn poll_new_trades(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<Trade>>;
            fn get_trade_history(&self, instrument_id: &InstrumentId) -> ExchangeResult<Vec<Trade>>;
            fn insert_order(&self, order: &OrderRequest) -> ExchangeResult<InsertResponse>;
            fn delete_order(&self, instrument_id: &InstrumentId, order_id: u64) -> ExchangeResult<()>;
            fn delete_orders(&self, instrument_id: &InstrumentId) -> ExchangeResult<()>;
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn signal(volume: Volume) -> ArbSignal {
        ArbSignal {
            primal: InstrumentId::from("B"),
            hedge: InstrumentId::from("A"),
            primal_side: Side::Bid,
            primal_price: Price::new(dec!(99.5)),
            hedge_price: Price::new(dec!(100.0)),
            volume,
            carry_factor: 1.0,
            detected_at: now(),
        }
    }

    fn trade(order_id: u64, instrument: &str, side: Side, volume: Volume) -> Trade {
        Trade {
            order_id,
            instrument_id: InstrumentId::from(instrument),
            price: Price::new(dec!(100)),
            volume,
            side,
        }
    }

    fn positions(b: Position, a: Position) -> HashMap<InstrumentId, Position> {
        HashMap::from([(InstrumentId::from("B"), b), (InstrumentId::from("A"), a)])
    }

    #[test]
    fn test_hedge_sized_to_primal_fill() {
        let mut venue = MockVenue::new();
        venue.expect_get_positions().returning(|| Ok(positions(0, 0)));
        venue
            .expect_insert_order()
            .withf(|o| o.instrument_id.as_str() == "B")
            .times(1)
            .returning(|o| {
                assert_eq!(o.volume, 30);
                assert_eq!(o.side, Side::Bid);
                Ok(InsertResponse::accepted(11))
            });
        venue
            .expect_insert_order()
            .withf(|o| o.instrument_id.as_str() == "A")
            .times(1)
            .returning(|o| {
                assert_eq!(o.volume, 18);
                assert_eq!(o.side, Side::Ask);
                assert_eq!(o.price.inner(), dec!(100.0));
                Ok(InsertResponse::accepted(12))
            });
        venue
            .expect_get_trade_history()
            .returning(|id| match id.as_str() {
                // two partial fills of our order plus an unrelated one
                "B" => Ok(vec![
                    trade(11, "B", Side::Bid, 10),
                    trade(3, "B", Side::Bid, 99),
                    trade(11, "B", Side::Bid, 8),
                ]),
                _ => Ok(vec![trade(12, "A", Side::Ask, 18)]),
            });

        let outcome = execute(&venue, &signal(30), 100).unwrap();
        assert_eq!(
            outcome,
            ArbOutcome::Hedged {
                primal_filled: 18,
                hedge_filled: 18
            }
        );
    }

    #[test]
    fn test_limit_precheck_sends_nothing() {
        let mut venue = MockVenue::new();
        // selling 30 of the hedge from -80 would reach -110
        venue.expect_get_positions().returning(|| Ok(positions(0, -80)));
        venue.expect_insert_order().never();

        let outcome = execute(&venue, &signal(30), 100).unwrap();
        assert_eq!(outcome, ArbOutcome::SkippedLimit);
    }

    #[test]
    fn test_primal_rejection_skips_hedge() {
        let mut venue = MockVenue::new();
        venue.expect_get_positions().returning(|| Ok(positions(0, 0)));
        venue
            .expect_insert_order()
            .times(1)
            .returning(|_| Ok(InsertResponse::rejected("instrument halted")));
        venue.expect_get_trade_history().never();

        let outcome = execute(&venue, &signal(30), 100).unwrap();
        assert_eq!(
            outcome,
            ArbOutcome::PrimalRejected {
                reason: "instrument halted".to_string()
            }
        );
    }

    #[test]
    fn test_zero_fill_skips_hedge() {
        let mut venue = MockVenue::new();
        venue.expect_get_positions().returning(|| Ok(positions(0, 0)));
        venue
            .expect_insert_order()
            .times(1)
            .returning(|_| Ok(InsertResponse::accepted(5)));
        venue.expect_get_trade_history().returning(|_| Ok(vec![]));

        let outcome = execute(&venue, &signal(30), 100).unwrap();
        assert_eq!(outcome, ArbOutcome::PrimalUnfilled);
    }

    #[test]
    fn test_hedge_limit_rechecked_after_fill() {
        let mut venue = MockVenue::new();
        let mut calls = 0;
        venue.expect_get_positions().returning(move || {
            calls += 1;
            // another strategy moved the hedge position between the legs
            Ok(if calls == 1 { positions(0, 0) } else { positions(10, -95) })
        });
        venue
            .expect_insert_order()
            .times(1)
            .returning(|_| Ok(InsertResponse::accepted(7)));
        venue
            .expect_get_trade_history()
            .returning(|_| Ok(vec![trade(7, "B", Side::Bid, 10)]));

        let outcome = execute(&venue, &signal(10), 100).unwrap();
        assert_eq!(outcome, ArbOutcome::HedgeSkippedLimit { primal_filled: 10 });
    }

    #[test]
    fn test_detect_and_trade_without_books() {
        let mut venue = MockVenue::new();
        venue.expect_get_last_price_book().returning(|_| Ok(None));
        venue.expect_insert_order().never();

        let pair = ArbPair {
            primal: Instrument::spot("B", Price::new(dec!(0.1))),
            hedge: Instrument::spot("A", Price::new(dec!(0.1))),
        };
        let detector = ArbitrageDetector::new(ArbitrageConfig::default()).unwrap();
        let model = PricingModel::default();
        assert!(detect_and_trade(&venue, &detector, &pair, &model, now())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_detect_and_trade_executes() {
        let mut venue = MockVenue::new();
        venue.expect_get_last_price_book().returning(|id| {
            let (bid, ask) = if id.as_str() == "B" {
                (dec!(99.0), dec!(99.5))
            } else {
                (dec!(100.0), dec!(100.1))
            };
            Ok(Some(OrderBook::new(
                id.clone(),
                vec![PriceLevel::new(Price::new(bid), 50)],
                vec![PriceLevel::new(Price::new(ask), 30)],
            )))
        });
        venue.expect_get_positions().returning(|| Ok(positions(0, 0)));
        venue
            .expect_insert_order()
            .times(2)
            .returning(|o| Ok(InsertResponse::accepted(if o.side == Side::Bid { 1 } else { 2 })));
        venue.expect_get_trade_history().returning(|id| {
            Ok(if id.as_str() == "B" {
                vec![trade(1, "B", Side::Bid, 30)]
            } else {
                vec![trade(2, "A", Side::Ask, 30)]
            })
        });

        let pair = ArbPair {
            primal: Instrument::spot("B", Price::new(dec!(0.1))),
            hedge: Instrument::spot("A", Price::new(dec!(0.1))),
        };
        let detector = ArbitrageDetector::new(ArbitrageConfig::default()).unwrap();
        let outcome = detect_and_trade(&venue, &detector, &pair, &PricingModel::default(), now())
            .unwrap()
            .unwrap();
        assert_eq!(
            outcome,
            ArbOutcome::Hedged {
                primal_filled: 30,
                hedge_filled: 30
            }
        );
    }
}

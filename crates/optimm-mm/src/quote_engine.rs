//! Quote construction.
//!
//! Turns a reference book and the current position into a two-sided quote:
//! fair bid/ask from the pricing model, widened by the policy credit,
//! rounded away from the touch and sized so that no single fill pushes the
//! position past the limit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use optimm_core::{mid_vwap, spread_vwap, Instrument, OrderBook, Position, Price, Quote, Side, Volume};
use optimm_pricing::PricingModel;

use crate::config::MakerConfig;
use crate::error::{MmError, MmResult};
use crate::policy::{credit_policy, volume_policy, CreditPair, VolumePair};

/// Volume that keeps `position` within `limit` after a full fill of `side`.
fn clamp_volume(side: Side, wanted: Volume, position: Position, limit: Position) -> Volume {
    let room = match side {
        Side::Bid => limit - position,
        Side::Ask => limit + position,
    };
    wanted.min(room.max(0) as Volume)
}

fn assemble(
    instrument: &Instrument,
    bid_price: Price,
    ask_price: Price,
    volume: VolumePair,
    position: Position,
    limit: Position,
) -> Quote {
    let quote = Quote {
        instrument_id: instrument.id.clone(),
        bid_price,
        bid_volume: clamp_volume(Side::Bid, volume.bid, position, limit),
        ask_price,
        ask_volume: clamp_volume(Side::Ask, volume.ask, position, limit),
    };
    if quote.is_crossed() {
        warn!(
            instrument = %instrument.id,
            bid = %quote.bid_price,
            ask = %quote.ask_price,
            "crossed self-quote after rounding"
        );
    }
    quote
}

/// Build the quote for `instrument` priced off `reference_book`.
#[allow(clippy::too_many_arguments)]
pub fn build_quote(
    model: &PricingModel,
    instrument: &Instrument,
    reference_book: &OrderBook,
    position: Position,
    credit: CreditPair,
    volume: VolumePair,
    limit: Position,
    now: DateTime<Utc>,
) -> MmResult<Quote> {
    let (ref_bid, ref_ask) = reference_book.top().ok_or_else(|| {
        MmError::DataUnavailable(format!(
            "reference book {} is empty or one-sided",
            reference_book.instrument_id
        ))
    })?;
    let (fair_bid, fair_ask) = model.fair_quotes(instrument, ref_bid.price, ref_ask.price, now)?;

    let tick = instrument.tick_size;
    let bid_price = Side::Bid.round_price(fair_bid - Price::new(credit.bid), tick);
    let ask_price = Side::Ask.round_price(fair_ask + Price::new(credit.ask), tick);

    debug!(
        instrument = %instrument.id,
        fair_bid = %fair_bid,
        fair_ask = %fair_ask,
        bid = %bid_price,
        ask = %ask_price,
        position,
        "computed quote"
    );
    Ok(assemble(instrument, bid_price, ask_price, volume, position, limit))
}

/// Credit that places our quote one tick inside the current best quote.
///
/// Falls back to `default` when the best quote is already through the
/// theoretical price.
pub fn best_quote_credit(
    best: Price,
    theoretical: Price,
    default: Decimal,
    side: Side,
    tick_size: Price,
) -> Decimal {
    let distance = match side {
        Side::Bid => theoretical - best,
        Side::Ask => best - theoretical,
    };
    if distance > tick_size {
        (distance - tick_size).inner()
    } else if !distance.inner().is_sign_negative() {
        distance.inner()
    } else {
        default
    }
}

/// Quote around the instrument's own book when no reference model applies.
///
/// The mid is the VWAP mid shifted against the position by up to one VWAP
/// spread; the spread is the VWAP spread less two ticks.
pub fn book_vwap_quote(
    instrument: &Instrument,
    book: &OrderBook,
    position: Position,
    base_volume: Volume,
    limit: Position,
) -> MmResult<Quote> {
    if limit <= 0 {
        return Err(MmError::Domain(format!("position limit must be > 0, got {limit}")));
    }
    let mid = mid_vwap(book).map_err(|e| MmError::DataUnavailable(e.to_string()))?;
    let spread = spread_vwap(book).map_err(|e| MmError::DataUnavailable(e.to_string()))?;
    if spread.inner().is_sign_negative() {
        return Err(MmError::MarketData(format!(
            "{}: negative vwap spread {spread}",
            instrument.id
        )));
    }

    let tick = instrument.tick_size;
    let penalty = spread * (-Decimal::from(position) / Decimal::from(limit));
    let mid = mid + penalty;
    if !mid.is_positive() {
        return Err(MmError::MarketData(format!(
            "{}: non-positive mid {mid}",
            instrument.id
        )));
    }
    let half_spread = (spread - tick * Decimal::TWO) / Decimal::TWO;
    let bid_price = Side::Bid.round_price(mid - half_spread, tick);
    let ask_price = Side::Ask.round_price(mid + half_spread, tick);

    debug!(
        instrument = %instrument.id,
        mid = %mid,
        spread = %spread,
        bid = %bid_price,
        ask = %ask_price,
        position,
        "computed book vwap quote"
    );
    Ok(assemble(
        instrument,
        bid_price,
        ask_price,
        VolumePair::uniform(base_volume),
        position,
        limit,
    ))
}

/// Policy-driven quoting for one strategy configuration.
#[derive(Debug, Clone)]
pub struct QuoteEngine {
    model: PricingModel,
    config: MakerConfig,
}

impl QuoteEngine {
    /// Validates the maker configuration up front.
    pub fn new(model: PricingModel, config: MakerConfig) -> MmResult<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &MakerConfig {
        &self.config
    }

    pub fn model(&self) -> &PricingModel {
        &self.model
    }

    /// Position handed to the policies.
    ///
    /// A breach that already exists is evaluated at the limit; the volume
    /// clamp then zeroes the side that would grow it further.
    fn policy_position(&self, instrument: &Instrument, position: Position) -> Position {
        let limit = self.config.position_limit;
        if position.abs() > limit {
            warn!(
                instrument = %instrument.id,
                position,
                limit,
                "position beyond limit, quoting as if at limit"
            );
            position.signum() * limit
        } else {
            position
        }
    }

    /// Quote `instrument` off `reference_book`.
    ///
    /// `own_book` is the instrument's own book, used when best-quote credit
    /// improvement is enabled.
    pub fn quote(
        &self,
        instrument: &Instrument,
        reference_book: &OrderBook,
        own_book: Option<&OrderBook>,
        position: Position,
        now: DateTime<Utc>,
    ) -> MmResult<Quote> {
        let p = self.policy_position(instrument, position);
        let mut credit = credit_policy(&self.config.credit_mode)?(p, &self.config)?;
        let volume = volume_policy(&self.config.volume_mode)?(p, &self.config)?;

        if self.config.improve_best_quote {
            if let (Some(book), Some((ref_bid, ref_ask))) = (own_book, reference_book.top()) {
                let (fair_bid, fair_ask) =
                    self.model
                        .fair_quotes(instrument, ref_bid.price, ref_ask.price, now)?;
                if let Some(best) = book.best_bid() {
                    credit.bid = best_quote_credit(
                        best.price,
                        fair_bid,
                        credit.bid,
                        Side::Bid,
                        instrument.tick_size,
                    );
                }
                if let Some(best) = book.best_ask() {
                    credit.ask = best_quote_credit(
                        best.price,
                        fair_ask,
                        credit.ask,
                        Side::Ask,
                        instrument.tick_size,
                    );
                }
            }
        }

        build_quote(
            &self.model,
            instrument,
            reference_book,
            position,
            credit,
            volume,
            self.config.position_limit,
            now,
        )
    }

    /// Book-VWAP quote with the configured base volume and limit.
    pub fn quote_from_book(
        &self,
        instrument: &Instrument,
        book: &OrderBook,
        position: Position,
    ) -> MmResult<Quote> {
        book_vwap_quote(
            instrument,
            book,
            position,
            self.config.base_volume,
            self.config.position_limit,
        )
    }
}

//! Contract dispatch and the configured pricing model.

use chrono::{DateTime, Utc};
use optimm_core::{Instrument, InstrumentKind, Price};
use tracing::trace;

use crate::black_scholes::{call_delta, call_value, put_delta, put_value};
use crate::config::PricingConfig;
use crate::error::{PricingError, PricingResult};

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0;

/// Payoff relationship between the primal instrument and its reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contract {
    /// Spot or dual listing: worth the reference price.
    Linear,
    /// Future on the reference, priced at carry.
    Forward { time_to_expiry: f64 },
    Call { strike: f64, time_to_expiry: f64 },
    Put { strike: f64, time_to_expiry: f64 },
}

impl Contract {
    pub fn is_option(&self) -> bool {
        matches!(self, Self::Call { .. } | Self::Put { .. })
    }
}

/// Year fraction between `now` and `expiry` (365-day year). Negative once expired.
pub fn time_to_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (expiry - now).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_YEAR
}

/// `exp(rate * time_to_expiry)`.
pub fn carry_factor(rate: f64, time_to_expiry: f64) -> f64 {
    (rate * time_to_expiry).exp()
}

fn check_inputs(contract: &Contract, stock_value: f64, rate: f64, volatility: f64) -> PricingResult<()> {
    if !(stock_value.is_finite() && stock_value > 0.0) {
        return Err(PricingError::Domain(format!(
            "stock value must be > 0, got {stock_value}"
        )));
    }
    if !rate.is_finite() {
        return Err(PricingError::Domain(format!("rate must be finite, got {rate}")));
    }
    if !(volatility.is_finite() && volatility > 0.0) {
        return Err(PricingError::Domain(format!(
            "volatility must be > 0, got {volatility}"
        )));
    }
    match *contract {
        Contract::Linear => Ok(()),
        Contract::Forward { time_to_expiry } if !time_to_expiry.is_finite() => Err(
            PricingError::Domain(format!("time to expiry must be finite, got {time_to_expiry}")),
        ),
        Contract::Forward { .. } => Ok(()),
        Contract::Call {
            strike,
            time_to_expiry,
        }
        | Contract::Put {
            strike,
            time_to_expiry,
        } => {
            if !(strike.is_finite() && strike > 0.0) {
                return Err(PricingError::Domain(format!("strike must be > 0, got {strike}")));
            }
            if !(time_to_expiry.is_finite() && time_to_expiry > 0.0) {
                return Err(PricingError::Domain(format!(
                    "time to expiry must be > 0, got {time_to_expiry}"
                )));
            }
            Ok(())
        }
    }
}

/// Theoretical value of `contract` given the reference price.
pub fn fair_value(
    contract: &Contract,
    stock_value: f64,
    rate: f64,
    volatility: f64,
) -> PricingResult<f64> {
    check_inputs(contract, stock_value, rate, volatility)?;
    let value = match *contract {
        Contract::Linear => stock_value,
        Contract::Forward { time_to_expiry } => stock_value * carry_factor(rate, time_to_expiry),
        Contract::Call {
            strike,
            time_to_expiry,
        } => call_value(stock_value, strike, time_to_expiry, rate, volatility),
        Contract::Put {
            strike,
            time_to_expiry,
        } => put_value(stock_value, strike, time_to_expiry, rate, volatility),
    };
    if !value.is_finite() {
        return Err(PricingError::Domain(format!("fair value is not finite: {value}")));
    }
    Ok(value)
}

/// Sensitivity of the fair value to the reference price.
pub fn delta(contract: &Contract, stock_value: f64, rate: f64, volatility: f64) -> PricingResult<f64> {
    check_inputs(contract, stock_value, rate, volatility)?;
    let d = match *contract {
        Contract::Linear | Contract::Forward { .. } => 1.0,
        Contract::Call {
            strike,
            time_to_expiry,
        } => call_delta(stock_value, strike, time_to_expiry, rate, volatility),
        Contract::Put {
            strike,
            time_to_expiry,
        } => put_delta(stock_value, strike, time_to_expiry, rate, volatility),
    };
    Ok(d)
}

/// Fair bid and ask from the reference bid and ask.
///
/// The model is evaluated at both reference prices and the results ordered,
/// so the bid is never above the ask even for decreasing payoffs.
pub fn fair_quotes(
    contract: &Contract,
    reference_bid: Price,
    reference_ask: Price,
    rate: f64,
    volatility: f64,
) -> PricingResult<(Price, Price)> {
    let at_bid = fair_value(contract, reference_bid.to_f64(), rate, volatility)?;
    let at_ask = fair_value(contract, reference_ask.to_f64(), rate, volatility)?;
    let fair_bid = Price::from_f64(at_bid.min(at_ask))?;
    let fair_ask = Price::from_f64(at_bid.max(at_ask))?;
    Ok((fair_bid, fair_ask))
}

/// Pricing functions bound to configured rate and volatility.
#[derive(Debug, Clone, Default)]
pub struct PricingModel {
    config: PricingConfig,
}

impl PricingModel {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn rate(&self) -> f64 {
        self.config.interest_rate
    }

    /// Map an instrument onto its contract at `now`.
    ///
    /// Fails with `Expired` once a dated instrument has reached expiry.
    pub fn contract(&self, instrument: &Instrument, now: DateTime<Utc>) -> PricingResult<Contract> {
        let tte = match instrument.expiry() {
            Some(expiry) => {
                let tte = time_to_expiry(expiry, now);
                if tte <= 0.0 {
                    return Err(PricingError::Expired(instrument.id.clone()));
                }
                tte
            }
            None => 0.0,
        };
        let contract = match &instrument.kind {
            InstrumentKind::Spot => Contract::Linear,
            InstrumentKind::Future { .. } => Contract::Forward {
                time_to_expiry: tte,
            },
            InstrumentKind::Call { strike, .. } => Contract::Call {
                strike: strike.to_f64(),
                time_to_expiry: tte,
            },
            InstrumentKind::Put { strike, .. } => Contract::Put {
                strike: strike.to_f64(),
                time_to_expiry: tte,
            },
        };
        trace!(instrument = %instrument.id, ?contract, "resolved contract");
        Ok(contract)
    }

    pub fn fair_quotes(
        &self,
        instrument: &Instrument,
        reference_bid: Price,
        reference_ask: Price,
        now: DateTime<Utc>,
    ) -> PricingResult<(Price, Price)> {
        let contract = self.contract(instrument, now)?;
        fair_quotes(
            &contract,
            reference_bid,
            reference_ask,
            self.config.interest_rate,
            self.config.volatility_for(instrument.id.as_str()),
        )
    }

    pub fn delta(
        &self,
        instrument: &Instrument,
        reference_price: Price,
        now: DateTime<Utc>,
    ) -> PricingResult<f64> {
        let contract = self.contract(instrument, now)?;
        delta(
            &contract,
            reference_price.to_f64(),
            self.config.interest_rate,
            self.config.volatility_for(instrument.id.as_str()),
        )
    }

    /// Carry between an instrument and its reference: `exp(rT)` for futures, 1 otherwise.
    pub fn carry_factor(&self, instrument: &Instrument, now: DateTime<Utc>) -> PricingResult<f64> {
        match self.contract(instrument, now)? {
            Contract::Forward { time_to_expiry } => {
                Ok(carry_factor(self.config.interest_rate, time_to_expiry))
            }
            _ => Ok(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn call(strike: f64, time_to_expiry: f64) -> Contract {
        Contract::Call {
            strike,
            time_to_expiry,
        }
    }

    #[test]
    fn test_time_to_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let tte = time_to_expiry(now + Duration::days(73), now);
        assert!((tte - 0.2).abs() < 1e-12);
        assert!(time_to_expiry(now - Duration::days(1), now) < 0.0);
    }

    #[test]
    fn test_forward_value() {
        let fwd = Contract::Forward {
            time_to_expiry: 0.5,
        };
        let v = fair_value(&fwd, 100.0, 0.03, 3.0).unwrap();
        assert!((v - 101.511306).abs() < 1e-6);
        assert_eq!(delta(&fwd, 100.0, 0.03, 3.0).unwrap(), 1.0);
    }

    #[test]
    fn test_linear_value() {
        assert_eq!(fair_value(&Contract::Linear, 42.5, 0.03, 3.0).unwrap(), 42.5);
    }

    #[test]
    fn test_domain_errors() {
        assert!(matches!(
            fair_value(&call(100.0, 0.1), 0.0, 0.03, 3.0),
            Err(PricingError::Domain(_))
        ));
        assert!(matches!(
            fair_value(&call(100.0, 0.1), 100.0, 0.03, 0.0),
            Err(PricingError::Domain(_))
        ));
        assert!(matches!(
            fair_value(&Contract::Linear, f64::NAN, 0.03, 3.0),
            Err(PricingError::Domain(_))
        ));
        assert!(matches!(
            fair_value(&call(100.0, 0.0), 100.0, 0.03, 3.0),
            Err(PricingError::Domain(_))
        ));
        assert!(matches!(
            fair_value(&Contract::Linear, 100.0, 0.03, 0.0),
            Err(PricingError::Domain(_))
        ));
        assert!(matches!(
            delta(&Contract::Forward { time_to_expiry: 0.5 }, 100.0, 0.03, -1.0),
            Err(PricingError::Domain(_))
        ));
    }

    #[test]
    fn test_fair_quotes_call() {
        let (bid, ask) = fair_quotes(
            &call(100.0, 0.1),
            Price::new(dec!(100.0)),
            Price::new(dec!(100.2)),
            0.03,
            3.0,
        )
        .unwrap();
        assert!((bid.to_f64() - 36.569685).abs() < 1e-4);
        assert!((ask.to_f64() - 36.706460).abs() < 1e-4);
    }

    #[test]
    fn test_fair_quotes_put_is_ordered() {
        let put = Contract::Put {
            strike: 100.0,
            time_to_expiry: 0.1,
        };
        let (bid, ask) = fair_quotes(
            &put,
            Price::new(dec!(100.0)),
            Price::new(dec!(100.2)),
            0.03,
            3.0,
        )
        .unwrap();
        assert!(bid < ask);
        // fv(100.2) < fv(100.0) for a put
        assert!((bid.to_f64() - 36.206909).abs() < 1e-4);
        assert!((ask.to_f64() - 36.270134).abs() < 1e-4);
    }

    #[test]
    fn test_model_expired() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let inst = Instrument::derivative(
            "OPT_C",
            Price::new(dec!(0.1)),
            InstrumentKind::Call {
                strike: Price::new(dec!(100)),
                expiry: now,
            },
            "PHILIPS_A",
        );
        let model = PricingModel::default();
        assert!(matches!(
            model.contract(&inst, now),
            Err(PricingError::Expired(_))
        ));
    }

    #[test]
    fn test_model_carry_factor() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let fut = Instrument::derivative(
            "FUT",
            Price::new(dec!(0.1)),
            InstrumentKind::Future {
                expiry: now + Duration::days(365),
            },
            "PHILIPS_A",
        );
        let model = PricingModel::default();
        let carry = model.carry_factor(&fut, now).unwrap();
        assert!((carry - 0.03f64.exp()).abs() < 1e-12);

        let spot = Instrument::spot("PHILIPS_B", Price::new(dec!(0.1)));
        assert_eq!(model.carry_factor(&spot, now).unwrap(), 1.0);
    }
}

//! Precision-safe price type.
//!
//! Prices sent to the exchange must be exact multiples of the instrument's
//! tick size, so they are kept as `rust_decimal::Decimal` and only converted
//! to `f64` at the boundary of the pricing math.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Price with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Convert a model output into a price.
    ///
    /// Fails for NaN and infinities so that they never reach an order.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(CoreError::InvalidPrice(format!("non-finite value {value}")));
        }
        Decimal::from_f64(value)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidPrice(format!("out of range {value}")))
    }

    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Largest multiple of `tick_size` not above this price.
    #[inline]
    pub fn round_down_to_tick(&self, tick_size: Price) -> Self {
        if tick_size.is_zero() {
            return *self;
        }
        Self((self.0 / tick_size.0).floor() * tick_size.0)
    }

    /// Smallest multiple of `tick_size` not below this price.
    #[inline]
    pub fn round_up_to_tick(&self, tick_size: Price) -> Self {
        if tick_size.is_zero() {
            return *self;
        }
        Self((self.0 / tick_size.0).ceil() * tick_size.0)
    }

    /// Integer tick index, rounding down.
    pub fn floor_ticks(&self, tick_size: Price) -> Result<i64> {
        Self::ticks(self.0, tick_size, Decimal::floor)
    }

    /// Integer tick index, rounding up.
    pub fn ceil_ticks(&self, tick_size: Price) -> Result<i64> {
        Self::ticks(self.0, tick_size, Decimal::ceil)
    }

    fn ticks(value: Decimal, tick_size: Price, round: fn(&Decimal) -> Decimal) -> Result<i64> {
        if !tick_size.is_positive() {
            return Err(CoreError::InvalidTickSize(tick_size.to_string()));
        }
        round(&(value / tick_size.0))
            .to_i64()
            .ok_or_else(|| CoreError::InvalidPrice(format!("{value} overflows tick index")))
    }

    /// Price of the given tick index.
    #[inline]
    pub fn from_ticks(ticks: i64, tick_size: Price) -> Self {
        Self(Decimal::from(ticks) * tick_size.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Price {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_down_and_up() {
        let p = Price::new(dec!(102.363));
        let tick = Price::new(dec!(0.1));

        assert_eq!(p.round_down_to_tick(tick).0, dec!(102.3));
        assert_eq!(p.round_up_to_tick(tick).0, dec!(102.4));
        assert_eq!(p.floor_ticks(tick).unwrap(), 1023);
        assert_eq!(p.ceil_ticks(tick).unwrap(), 1024);
    }

    #[test]
    fn test_rounding_brackets_price() {
        let tick = Price::new(dec!(0.25));
        for raw in [dec!(0.01), dec!(3.0), dec!(3.1), dec!(99.99), dec!(-1.3)] {
            let p = Price::new(raw);
            let down = p.round_down_to_tick(tick);
            let up = p.round_up_to_tick(tick);
            assert!(down <= p && p < down + tick, "down {down} for {p}");
            assert!(up - tick < p && p <= up, "up {up} for {p}");
        }
    }

    #[test]
    fn test_exact_multiple_unchanged() {
        let p = Price::new(dec!(100.2));
        let tick = Price::new(dec!(0.1));
        assert_eq!(p.round_down_to_tick(tick), p);
        assert_eq!(p.round_up_to_tick(tick), p);
    }

    #[test]
    fn test_tick_index_round_trip() {
        let tick = Price::new(dec!(0.1));
        assert_eq!(Price::from_ticks(1002, tick).0, dec!(100.2));
        assert!(Price::ONE.floor_ticks(Price::ZERO).is_err());
    }

    #[test]
    fn test_from_f64_rejects_nan() {
        assert!(Price::from_f64(f64::NAN).is_err());
        assert!(Price::from_f64(f64::INFINITY).is_err());
        let p = Price::from_f64(36.5).unwrap();
        assert_eq!(p.0, dec!(36.5));
    }

    #[test]
    fn test_parse() {
        let p: Price = "100.25".parse().unwrap();
        assert_eq!(p.0, dec!(100.25));
        assert!("abc".parse::<Price>().is_err());
    }
}

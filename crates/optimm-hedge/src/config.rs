//! Hedging configuration.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use optimm_core::{Position, Price};

use crate::error::{HedgeError, HedgeResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Instrument used to offset delta.
    pub hedge_instrument: String,

    /// Absolute position limit of the hedge instrument.
    #[serde(default = "default_position_limit")]
    pub position_limit: Position,

    /// Limit price of hedge buys; high enough to always cross.
    #[serde(default = "default_max_buying_price")]
    pub max_buying_price: Price,

    /// Limit price of hedge sells; low enough to always cross.
    #[serde(default = "default_min_selling_price")]
    pub min_selling_price: Price,
}

fn default_true() -> bool {
    true
}
fn default_position_limit() -> Position {
    100
}
fn default_max_buying_price() -> Price {
    Price::new(dec!(100000))
}
fn default_min_selling_price() -> Price {
    Price::new(dec!(0.10))
}

impl HedgeConfig {
    pub fn new(hedge_instrument: impl Into<String>) -> Self {
        Self {
            enabled: true,
            hedge_instrument: hedge_instrument.into(),
            position_limit: default_position_limit(),
            max_buying_price: default_max_buying_price(),
            min_selling_price: default_min_selling_price(),
        }
    }

    pub fn validate(&self) -> HedgeResult<()> {
        if self.position_limit <= 0 {
            return Err(HedgeError::Config(format!(
                "position_limit must be > 0, got {}",
                self.position_limit
            )));
        }
        if !self.min_selling_price.is_positive() || self.min_selling_price >= self.max_buying_price {
            return Err(HedgeError::Config(format!(
                "need 0 < min_selling_price ({}) < max_buying_price ({})",
                self.min_selling_price, self.max_buying_price
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_toml() {
        let config: HedgeConfig = toml::from_str(r#"hedge_instrument = "PHILIPS_A""#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.position_limit, 100);
        assert_eq!(config.max_buying_price, Price::new(dec!(100000)));
        assert_eq!(config.min_selling_price, Price::new(dec!(0.10)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_prices_rejected() {
        let mut config = HedgeConfig::new("X");
        config.min_selling_price = Price::new(dec!(200000));
        assert!(config.validate().is_err());
    }
}

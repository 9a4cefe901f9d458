//! Pricing model configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, PricingResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Annualised risk-free rate, continuously compounded.
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,

    /// Annualised volatility used for every option unless overridden.
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Per-instrument volatility overrides, keyed by instrument id.
    #[serde(default)]
    pub volatility_overrides: HashMap<String, f64>,
}

fn default_interest_rate() -> f64 {
    0.03
}
fn default_volatility() -> f64 {
    3.0
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            interest_rate: default_interest_rate(),
            volatility: default_volatility(),
            volatility_overrides: HashMap::new(),
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> PricingResult<()> {
        if !self.interest_rate.is_finite() {
            return Err(PricingError::Config(format!(
                "interest_rate must be finite, got {}",
                self.interest_rate
            )));
        }
        let vols = std::iter::once(("default", self.volatility)).chain(
            self.volatility_overrides
                .iter()
                .map(|(k, v)| (k.as_str(), *v)),
        );
        for (name, vol) in vols {
            if !(vol.is_finite() && vol > 0.0) {
                return Err(PricingError::Config(format!(
                    "volatility for {name} must be > 0, got {vol}"
                )));
            }
        }
        Ok(())
    }

    pub fn volatility_for(&self, instrument: &str) -> f64 {
        self.volatility_overrides
            .get(instrument)
            .copied()
            .unwrap_or(self.volatility)
    }
}

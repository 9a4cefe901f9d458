//! Market making configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use optimm_core::{Position, Price, Volume};

use crate::error::{MmError, MmResult};
use crate::policy::{credit_policy, volume_policy};

/// Parameters of the `slippery` credit policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlipperyConfig {
    /// Position (in lots) where flat credit turns exponential.
    #[serde(default = "default_slippery_threshold")]
    pub threshold: Position,

    /// Credit reached at the position limit.
    #[serde(default = "default_credit_at_limit")]
    pub credit_at_limit: Decimal,
}

impl Default for SlipperyConfig {
    fn default() -> Self {
        Self {
            threshold: default_slippery_threshold(),
            credit_at_limit: default_credit_at_limit(),
        }
    }
}

/// Market making configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Distance from fair value to each quote, before policy adjustment.
    #[serde(default = "default_base_credit")]
    pub base_credit: Decimal,

    /// Lots per side, before policy adjustment.
    #[serde(default = "default_base_volume")]
    pub base_volume: Volume,

    /// Absolute position limit per instrument.
    #[serde(default = "default_position_limit")]
    pub position_limit: Position,

    /// Credit policy name (see `CREDIT_POLICIES`).
    #[serde(default = "default_mode")]
    pub credit_mode: String,

    /// Volume policy name (see `VOLUME_POLICIES`).
    #[serde(default = "default_mode")]
    pub volume_mode: String,

    #[serde(default)]
    pub slippery: SlipperyConfig,

    /// Derive credit from the primal's own best quote, one tick inside it.
    #[serde(default)]
    pub improve_best_quote: bool,

    /// Replace a resting order whose volume differs from the desired leg
    /// by more than this percentage. `None` leaves volumes alone.
    #[serde(default)]
    pub amend_volume_drift_pct: Option<Decimal>,
}

fn default_base_credit() -> Decimal {
    dec!(0.1)
}
fn default_base_volume() -> Volume {
    10
}
fn default_position_limit() -> Position {
    100
}
fn default_mode() -> String {
    "constant".to_string()
}
fn default_slippery_threshold() -> Position {
    20
}
fn default_credit_at_limit() -> Decimal {
    dec!(1.0)
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            base_credit: default_base_credit(),
            base_volume: default_base_volume(),
            position_limit: default_position_limit(),
            credit_mode: default_mode(),
            volume_mode: default_mode(),
            slippery: SlipperyConfig::default(),
            improve_best_quote: false,
            amend_volume_drift_pct: None,
        }
    }
}

impl MakerConfig {
    /// Reject unknown policy names and out-of-range parameters.
    pub fn validate(&self) -> MmResult<()> {
        credit_policy(&self.credit_mode)?;
        volume_policy(&self.volume_mode)?;

        if self.position_limit <= 0 {
            return Err(MmError::Config(format!(
                "position_limit must be > 0, got {}",
                self.position_limit
            )));
        }
        if self.base_credit.is_sign_negative() {
            return Err(MmError::Config(format!(
                "base_credit must be >= 0, got {}",
                self.base_credit
            )));
        }
        if self.credit_mode == "slippery" {
            let s = &self.slippery;
            if s.threshold <= 0 || s.threshold >= self.position_limit {
                return Err(MmError::Config(format!(
                    "slippery.threshold must be in (0, {}), got {}",
                    self.position_limit, s.threshold
                )));
            }
            if self.base_credit <= Decimal::ZERO || s.credit_at_limit <= Decimal::ZERO {
                return Err(MmError::Config(
                    "slippery requires base_credit and credit_at_limit > 0".to_string(),
                ));
            }
        }
        if let Some(pct) = self.amend_volume_drift_pct {
            if pct.is_sign_negative() {
                return Err(MmError::Config(format!(
                    "amend_volume_drift_pct must be >= 0, got {pct}"
                )));
            }
        }
        Ok(())
    }

    /// Warn when rounding alone can cross the quote.
    ///
    /// Returns true if `base_credit` is below half of `tick_size`.
    pub fn check_credit_against_tick(&self, instrument: &str, tick_size: Price) -> bool {
        let too_small = self.base_credit < tick_size.inner() / Decimal::TWO;
        if too_small {
            warn!(
                instrument,
                credit = %self.base_credit,
                tick = %tick_size,
                "base credit below half a tick, quotes may cross after rounding"
            );
        }
        too_small
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MakerConfig::default();
        assert_eq!(config.base_credit, dec!(0.1));
        assert_eq!(config.base_volume, 10);
        assert_eq!(config.position_limit, 100);
        assert_eq!(config.credit_mode, "constant");
        assert!(config.amend_volume_drift_pct.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serde_defaults() {
        let toml_str = r#"
credit_mode = "slippery"
volume_mode = "linear-advocate"

[slippery]
threshold = 30
"#;
        let config: MakerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.credit_mode, "slippery");
        assert_eq!(config.slippery.threshold, 30);
        assert_eq!(config.slippery.credit_at_limit, dec!(1.0));
        assert_eq!(config.base_volume, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let config = MakerConfig {
            credit_mode: "aggressive".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MmError::Config(_))));
    }

    #[test]
    fn test_slippery_threshold_bounds() {
        let config = MakerConfig {
            credit_mode: "slippery".to_string(),
            slippery: SlipperyConfig {
                threshold: 100,
                credit_at_limit: dec!(1),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credit_below_half_tick() {
        let config = MakerConfig {
            base_credit: dec!(0.04),
            ..Default::default()
        };
        assert!(config.check_credit_against_tick("X", Price::new(dec!(0.1))));
        assert!(!MakerConfig::default().check_credit_against_tick("X", Price::new(dec!(0.1))));
    }
}

//! Arbitrage configuration.

use serde::{Deserialize, Serialize};

use optimm_core::Position;

use crate::error::{DetectorError, DetectorResult};

/// One primal/hedge pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArbPairConfig {
    /// Illiquid instrument, traded first.
    pub primal: String,
    /// Liquid instrument that offsets the primal fill.
    pub hedge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub pairs: Vec<ArbPairConfig>,

    /// Absolute position limit applied to both legs.
    #[serde(default = "default_position_limit")]
    pub position_limit: Position,
}

fn default_position_limit() -> Position {
    100
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pairs: Vec::new(),
            position_limit: default_position_limit(),
        }
    }
}

impl ArbitrageConfig {
    pub fn validate(&self) -> DetectorResult<()> {
        if self.position_limit <= 0 {
            return Err(DetectorError::ConfigError(format!(
                "position_limit must be > 0, got {}",
                self.position_limit
            )));
        }
        for pair in &self.pairs {
            if pair.primal == pair.hedge {
                return Err(DetectorError::ConfigError(format!(
                    "pair trades {} against itself",
                    pair.primal
                )));
            }
        }
        Ok(())
    }
}

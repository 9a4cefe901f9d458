//! Application configuration.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use optimm_core::{Instrument, OrderBook, Position, Price};
use optimm_detector::ArbitrageConfig;
use optimm_hedge::HedgeConfig;
use optimm_mm::MakerConfig;
use optimm_pricing::PricingConfig;

use crate::error::{AppError, AppResult};

/// How an instrument's fair value is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    /// Pricing model off the base instrument's book.
    #[default]
    Model,
    /// VWAP of the instrument's own book.
    BookVwap,
}

/// An instrument the engine quotes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotedInstrumentConfig {
    pub id: String,
    #[serde(default)]
    pub source: QuoteSource,
}

/// Loop cadence and start-up behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_quote_interval_ms")]
    pub quote_interval_ms: u64,

    /// Cadence of the hedging and arbitrage cycles.
    #[serde(default = "default_hedge_interval_ms")]
    pub hedge_interval_ms: u64,

    /// Read books, positions and orders from a background snapshot instead
    /// of querying the exchange on every cycle.
    #[serde(default)]
    pub use_snapshot_cache: bool,

    #[serde(default = "default_snapshot_interval_ms")]
    pub snapshot_interval_ms: u64,

    /// Cancel all orders and close all positions before quoting.
    #[serde(default)]
    pub clear_on_start: bool,

    #[serde(default = "default_clear_min_selling_price")]
    pub clear_min_selling_price: Price,

    #[serde(default = "default_clear_max_buying_price")]
    pub clear_max_buying_price: Price,

    /// Number of quoting cycles to run; unbounded when absent.
    #[serde(default)]
    pub iterations: Option<u64>,
}

fn default_quote_interval_ms() -> u64 {
    500
}
fn default_hedge_interval_ms() -> u64 {
    1_000
}
fn default_snapshot_interval_ms() -> u64 {
    200
}
fn default_clear_min_selling_price() -> Price {
    Price::new(dec!(0.10))
}
fn default_clear_max_buying_price() -> Price {
    Price::new(dec!(100000))
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            quote_interval_ms: default_quote_interval_ms(),
            hedge_interval_ms: default_hedge_interval_ms(),
            use_snapshot_cache: false,
            snapshot_interval_ms: default_snapshot_interval_ms(),
            clear_on_start: false,
            clear_min_selling_price: default_clear_min_selling_price(),
            clear_max_buying_price: default_clear_max_buying_price(),
            iterations: None,
        }
    }
}

/// Seed data for the in-memory exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub books: Vec<OrderBook>,
    /// Starting positions keyed by instrument id.
    #[serde(default)]
    pub positions: HashMap<String, Position>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub maker: MakerConfig,
    #[serde(default)]
    pub hedge: Option<HedgeConfig>,
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub instruments: Vec<QuotedInstrumentConfig>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Load from `OPTIMM_CONFIG`, falling back to `config/default.toml`.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("OPTIMM_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            tracing::info!(config_path = %config_path, "Loading configuration");
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section; unknown policy names and bad numbers fail here.
    pub fn validate(&self) -> AppResult<()> {
        self.pricing.validate()?;
        self.maker.validate()?;
        if let Some(hedge) = &self.hedge {
            hedge.validate()?;
        }
        self.arbitrage.validate()?;

        let rt = &self.runtime;
        if rt.quote_interval_ms == 0 || rt.hedge_interval_ms == 0 || rt.snapshot_interval_ms == 0
        {
            return Err(AppError::Config(
                "runtime intervals must be > 0".to_string(),
            ));
        }
        if !rt.clear_min_selling_price.is_positive()
            || rt.clear_min_selling_price > rt.clear_max_buying_price
        {
            return Err(AppError::Config(format!(
                "clearing prices must satisfy 0 < {} <= {}",
                rt.clear_min_selling_price, rt.clear_max_buying_price
            )));
        }
        for instrument in &self.simulation.instruments {
            instrument.validate()?;
        }
        Ok(())
    }

    /// Ids of every instrument the engine reads market data for.
    pub fn watched_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.instruments.iter().map(|i| i.id.clone()).collect();
        if let Some(hedge) = &self.hedge {
            ids.push(hedge.hedge_instrument.clone());
        }
        for pair in &self.arbitrage.pairs {
            ids.push(pair.primal.clone());
            ids.push(pair.hedge.clone());
        }
        ids.sort();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimm_core::InstrumentKind;

    const SAMPLE: &str = r#"
[pricing]
interest_rate = 0.03
volatility = 3.0

[maker]
base_credit = "0.1"
base_volume = 10
position_limit = 100
credit_mode = "linear-advocate"
volume_mode = "constant"

[hedge]
hedge_instrument = "PHILIPS_A"

[arbitrage]
enabled = true
pairs = [{ primal = "PHILIPS_B", hedge = "PHILIPS_A" }]

[runtime]
quote_interval_ms = 100
iterations = 3

[[instruments]]
id = "OPT_C_100"

[[instruments]]
id = "PHILIPS_B"
source = "book_vwap"

[[simulation.instruments]]
id = "PHILIPS_A"
tick_size = "0.1"
kind = { type = "spot" }

[[simulation.instruments]]
id = "OPT_C_100"
tick_size = "0.1"
base_instrument_id = "PHILIPS_A"
kind = { type = "call", strike = "100", expiry = "2027-01-01T00:00:00Z" }

[[simulation.books]]
instrument_id = "PHILIPS_A"
bids = [{ price = "100.0", volume = 50 }]
asks = [{ price = "100.2", volume = 50 }]
"#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.maker.credit_mode, "linear-advocate");
        assert_eq!(config.runtime.iterations, Some(3));
        assert_eq!(config.runtime.hedge_interval_ms, 1_000);
        assert_eq!(config.instruments[0].source, QuoteSource::Model);
        assert_eq!(config.instruments[1].source, QuoteSource::BookVwap);
        assert!(matches!(
            config.simulation.instruments[1].kind,
            InstrumentKind::Call { .. }
        ));
        assert_eq!(
            config.watched_ids(),
            vec!["OPT_C_100", "PHILIPS_A", "PHILIPS_B"]
        );
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert!(config.hedge.is_none());
        assert!(!config.arbitrage.enabled);
        assert!(!config.runtime.use_snapshot_cache);
        assert!(config.runtime.iterations.is_none());
    }

    #[test]
    fn test_load_from_env_path() {
        let sample = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
        std::env::set_var("OPTIMM_CONFIG", sample);
        let config = AppConfig::load().unwrap();
        assert!(!config.instruments.is_empty());
        assert!(!config.simulation.instruments.is_empty());

        std::env::set_var("OPTIMM_CONFIG", "does/not/exist.toml");
        let config = AppConfig::load().unwrap();
        assert!(config.instruments.is_empty());
        std::env::remove_var("OPTIMM_CONFIG");
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = AppConfig::from_toml("[maker]\ncredit_mode = \"aggressive\"\n").unwrap_err();
        assert!(matches!(err, AppError::Mm(_)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = AppConfig::from_toml("[runtime]\nquote_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}

//! Instrument reference data.
//!
//! Instruments are immutable for the lifetime of the process. Derivatives
//! carry the id of the instrument they are priced from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::Price;
use crate::error::{CoreError, Result};

/// Exchange instrument identifier (e.g. "PHILIPS_A", "OPT_C_100").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What an instrument is, with the parameters needed to price it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InstrumentKind {
    Spot,
    Future { expiry: DateTime<Utc> },
    Call { strike: Price, expiry: DateTime<Utc> },
    Put { strike: Price, expiry: DateTime<Utc> },
}

impl InstrumentKind {
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Spot => None,
            Self::Future { expiry } | Self::Call { expiry, .. } | Self::Put { expiry, .. } => {
                Some(*expiry)
            }
        }
    }

    pub fn is_option(&self) -> bool {
        matches!(self, Self::Call { .. } | Self::Put { .. })
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
            Self::Future { .. } => write!(f, "future"),
            Self::Call { strike, .. } => write!(f, "call@{strike}"),
            Self::Put { strike, .. } => write!(f, "put@{strike}"),
        }
    }
}

/// A tradable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub tick_size: Price,
    pub kind: InstrumentKind,
    /// Reference instrument for derivatives and dual listings.
    #[serde(default)]
    pub base_instrument_id: Option<InstrumentId>,
}

impl Instrument {
    #[must_use]
    pub fn spot(id: impl Into<String>, tick_size: Price) -> Self {
        Self {
            id: InstrumentId::new(id),
            tick_size,
            kind: InstrumentKind::Spot,
            base_instrument_id: None,
        }
    }

    #[must_use]
    pub fn derivative(
        id: impl Into<String>,
        tick_size: Price,
        kind: InstrumentKind,
        base: impl Into<String>,
    ) -> Self {
        Self {
            id: InstrumentId::new(id),
            tick_size,
            kind,
            base_instrument_id: Some(InstrumentId::new(base)),
        }
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.kind.expiry()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tick_size.is_positive() {
            return Err(CoreError::InvalidTickSize(format!(
                "{}: tick_size {} must be > 0",
                self.id, self.tick_size
            )));
        }
        match &self.kind {
            InstrumentKind::Call { strike, .. } | InstrumentKind::Put { strike, .. }
                if !strike.is_positive() =>
            {
                Err(CoreError::InvalidPrice(format!(
                    "{}: strike {strike} must be > 0",
                    self.id
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_tick_size() {
        let ok = Instrument::spot("PHILIPS_A", Price::new(dec!(0.1)));
        assert!(ok.validate().is_ok());

        let bad = Instrument::spot("PHILIPS_A", Price::ZERO);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_option_expiry() {
        let expiry = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();
        let call = Instrument::derivative(
            "OPT_C",
            Price::new(dec!(0.1)),
            InstrumentKind::Call {
                strike: Price::new(dec!(100)),
                expiry,
            },
            "PHILIPS_A",
        );
        assert!(call.kind.is_option());
        assert_eq!(call.expiry(), Some(expiry));
        assert_eq!(call.base_instrument_id, Some(InstrumentId::from("PHILIPS_A")));
    }

    #[test]
    fn test_kind_from_toml() {
        let toml_str = r#"
id = "OPT_P"
tick_size = "0.1"
base_instrument_id = "PHILIPS_A"

[kind]
type = "put"
strike = "95"
expiry = "2027-03-19T12:00:00Z"
"#;
        let inst: Instrument = toml::from_str(toml_str).unwrap();
        assert_eq!(inst.tick_size, Price::new(dec!(0.1)));
        match inst.kind {
            InstrumentKind::Put { strike, .. } => assert_eq!(strike.0, dec!(95)),
            other => panic!("unexpected kind {other}"),
        }
    }
}

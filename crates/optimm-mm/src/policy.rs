//! Credit and volume policies.
//!
//! Each policy is a pure function of the current position and the maker
//! parameters. Policies are looked up by name so a new one is a table entry
//! rather than a new branch. All are defined for positions in `[-L, L]`
//! and fail outside it; callers decide how to treat a pre-existing breach.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use optimm_core::{Position, Side, Volume};

use crate::config::{MakerConfig, SlipperyConfig};
use crate::error::{MmError, MmResult};

/// Credit per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPair {
    pub bid: Decimal,
    pub ask: Decimal,
}

impl CreditPair {
    pub fn uniform(credit: Decimal) -> Self {
        Self {
            bid: credit,
            ask: credit,
        }
    }

    pub fn get(&self, side: Side) -> Decimal {
        match side {
            Side::Bid => self.bid,
            Side::Ask => self.ask,
        }
    }
}

/// Volume per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumePair {
    pub bid: Volume,
    pub ask: Volume,
}

impl VolumePair {
    pub fn uniform(volume: Volume) -> Self {
        Self {
            bid: volume,
            ask: volume,
        }
    }
}

pub type CreditFn = fn(Position, &MakerConfig) -> MmResult<CreditPair>;
pub type VolumeFn = fn(Position, &MakerConfig) -> MmResult<VolumePair>;

pub const CREDIT_POLICIES: &[(&str, CreditFn)] = &[
    ("constant", constant_credit),
    ("rigid", rigid_credit),
    ("linear-advocate", linear_advocate_credit),
    ("slippery", slippery_credit),
];

pub const VOLUME_POLICIES: &[(&str, VolumeFn)] = &[
    ("constant", constant_volume),
    ("linear-deprecate", linear_deprecate_volume),
    ("linear-advocate", linear_advocate_volume),
];

pub fn credit_policy(name: &str) -> MmResult<CreditFn> {
    CREDIT_POLICIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
        .ok_or_else(|| MmError::Config(format!("unknown credit mode '{name}'")))
}

pub fn volume_policy(name: &str) -> MmResult<VolumeFn> {
    VOLUME_POLICIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
        .ok_or_else(|| MmError::Config(format!("unknown volume mode '{name}'")))
}

fn check_range(position: Position, limit: Position) -> MmResult<()> {
    if limit <= 0 {
        return Err(MmError::Domain(format!("position limit must be > 0, got {limit}")));
    }
    if position.abs() > limit {
        return Err(MmError::Domain(format!(
            "position {position} outside [-{limit}, {limit}]"
        )));
    }
    Ok(())
}

/// `1 - |p| / L` as an exact decimal.
fn headroom(position: Position, limit: Position) -> Decimal {
    Decimal::from(limit - position.abs()) / Decimal::from(limit)
}

fn constant_credit(position: Position, config: &MakerConfig) -> MmResult<CreditPair> {
    check_range(position, config.position_limit)?;
    Ok(CreditPair::uniform(config.base_credit))
}

/// Zero credit on the side that would unwind a position sitting at the limit.
fn rigid_credit(position: Position, config: &MakerConfig) -> MmResult<CreditPair> {
    let limit = config.position_limit;
    check_range(position, limit)?;
    let mut credit = CreditPair::uniform(config.base_credit);
    if position == limit {
        credit.ask = Decimal::ZERO;
    } else if position == -limit {
        credit.bid = Decimal::ZERO;
    }
    Ok(credit)
}

/// Tighten the side that reduces exposure in proportion to the position.
fn linear_advocate_credit(position: Position, config: &MakerConfig) -> MmResult<CreditPair> {
    let limit = config.position_limit;
    check_range(position, limit)?;
    let mut credit = CreditPair::uniform(config.base_credit);
    let reduced = config.base_credit * headroom(position, limit);
    if position > 0 {
        credit.ask = reduced;
    } else if position < 0 {
        credit.bid = reduced;
    }
    Ok(credit)
}

fn slippery_credit(position: Position, config: &MakerConfig) -> MmResult<CreditPair> {
    let limit = config.position_limit;
    check_range(position, limit)?;
    Ok(CreditPair {
        bid: slippery_side(position, config.base_credit, &config.slippery, limit)?,
        ask: slippery_side(-position, config.base_credit, &config.slippery, limit)?,
    })
}

/// Credit for one side, `x` being the position as seen from that side
/// (positive means the side adds to exposure).
fn slippery_side(
    x: Position,
    base: Decimal,
    slippery: &SlipperyConfig,
    limit: Position,
) -> MmResult<Decimal> {
    let threshold = slippery.threshold;
    if threshold <= 0 {
        return Err(MmError::Domain(format!(
            "slippery threshold must be > 0, got {threshold}"
        )));
    }
    if x < -threshold {
        Ok(Decimal::ZERO)
    } else if x < 0 {
        Ok(base * Decimal::from(x + threshold) / Decimal::from(threshold))
    } else if x < threshold {
        Ok(base)
    } else if x <= limit {
        exponential_credit(base, slippery.credit_at_limit, threshold, limit, x)
    } else {
        Err(MmError::Domain(format!("position {x} beyond limit {limit}")))
    }
}

/// Exponential through `(x_lo, c_lo)` and `(x_hi, c_hi)`, evaluated at `x`.
pub fn exponential_credit(
    c_lo: Decimal,
    c_hi: Decimal,
    x_lo: Position,
    x_hi: Position,
    x: Position,
) -> MmResult<Decimal> {
    let (lo, hi) = match (c_lo.to_f64(), c_hi.to_f64()) {
        (Some(lo), Some(hi)) if lo > 0.0 && hi > 0.0 => (lo, hi),
        _ => {
            return Err(MmError::Domain(format!(
                "exponential credit needs positive endpoints, got {c_lo} and {c_hi}"
            )))
        }
    };
    if x_hi == x_lo {
        return Ok(c_lo);
    }
    let k = (hi.ln() - lo.ln()) / (x_hi - x_lo) as f64;
    let b = lo.ln() - k * x_lo as f64;
    let value = (k * x as f64 + b).exp();
    Decimal::from_f64(value)
        .ok_or_else(|| MmError::Domain(format!("credit not representable: {value}")))
}

fn constant_volume(position: Position, config: &MakerConfig) -> MmResult<VolumePair> {
    check_range(position, config.position_limit)?;
    Ok(VolumePair::uniform(config.base_volume))
}

/// Shrink the side that would grow exposure; the unwinding side keeps `v0`.
fn linear_deprecate_volume(position: Position, config: &MakerConfig) -> MmResult<VolumePair> {
    let limit = config.position_limit;
    check_range(position, limit)?;
    let base = config.base_volume as i64;
    let shrunk = (base * (limit - position.abs())).div_euclid(limit) as Volume;
    let mut volume = VolumePair::uniform(config.base_volume);
    if position > 0 {
        volume.bid = shrunk;
    } else if position < 0 {
        volume.ask = shrunk;
    }
    Ok(volume)
}

/// Grow the unwinding side towards the full position.
fn linear_advocate_volume(position: Position, config: &MakerConfig) -> MmResult<VolumePair> {
    let limit = config.position_limit;
    check_range(position, limit)?;
    let base = config.base_volume as i64;
    let grown = ((base * (limit - position.abs())).div_euclid(limit) + position.abs()) as Volume;
    let mut volume = VolumePair::uniform(config.base_volume);
    if position > 0 {
        volume.ask = grown;
    } else if position < 0 {
        volume.bid = grown;
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cfg(credit_mode: &str, volume_mode: &str) -> MakerConfig {
        MakerConfig {
            base_credit: dec!(0.2),
            base_volume: 10,
            position_limit: 100,
            credit_mode: credit_mode.to_string(),
            volume_mode: volume_mode.to_string(),
            slippery: SlipperyConfig {
                threshold: 20,
                credit_at_limit: dec!(0.05),
            },
            ..Default::default()
        }
    }

    fn credit(mode: &str, p: Position) -> CreditPair {
        let c = cfg(mode, "constant");
        credit_policy(mode).unwrap()(p, &c).unwrap()
    }

    fn volume(mode: &str, p: Position) -> VolumePair {
        let c = cfg("constant", mode);
        volume_policy(mode).unwrap()(p, &c).unwrap()
    }

    #[test]
    fn test_lookup() {
        assert!(credit_policy("slippery").is_ok());
        assert!(matches!(credit_policy("nope"), Err(MmError::Config(_))));
        assert!(matches!(volume_policy("rigid"), Err(MmError::Config(_))));
    }

    #[test]
    fn test_every_policy_total_on_range() {
        for (name, f) in CREDIT_POLICIES {
            let c = cfg(name, "constant");
            for p in -100..=100 {
                let pair = f(p, &c).unwrap_or_else(|e| panic!("{name} at {p}: {e}"));
                assert!(pair.bid >= Decimal::ZERO && pair.ask >= Decimal::ZERO);
            }
        }
        for (name, f) in VOLUME_POLICIES {
            let c = cfg("constant", name);
            for p in -100..=100 {
                assert!(f(p, &c).is_ok(), "{name} at {p}");
            }
        }
    }

    #[test]
    fn test_out_of_range_fails() {
        for (_, f) in CREDIT_POLICIES {
            assert!(matches!(f(101, &cfg("constant", "constant")), Err(MmError::Domain(_))));
        }
        for (_, f) in VOLUME_POLICIES {
            assert!(matches!(f(-101, &cfg("constant", "constant")), Err(MmError::Domain(_))));
        }
        let mut c = cfg("constant", "constant");
        c.position_limit = 0;
        assert!(constant_credit(0, &c).is_err());
    }

    #[test]
    fn test_rigid_at_limits() {
        assert_eq!(credit("rigid", 100), CreditPair { bid: dec!(0.2), ask: dec!(0) });
        assert_eq!(credit("rigid", -100), CreditPair { bid: dec!(0), ask: dec!(0.2) });
        assert_eq!(credit("rigid", 99), CreditPair::uniform(dec!(0.2)));
    }

    #[test]
    fn test_linear_advocate_credit() {
        assert_eq!(credit("linear-advocate", 50), CreditPair { bid: dec!(0.2), ask: dec!(0.1) });
        assert_eq!(credit("linear-advocate", -25), CreditPair { bid: dec!(0.15), ask: dec!(0.2) });
        assert_eq!(credit("linear-advocate", 0), CreditPair::uniform(dec!(0.2)));
    }

    #[test]
    fn test_slippery_regions() {
        // flat region
        assert_eq!(credit("slippery", 0), CreditPair::uniform(dec!(0.2)));
        // short 10: bid x=-10 on the ramp, ask x=10 flat
        let c = credit("slippery", -10);
        assert_eq!(c.bid, dec!(0.1));
        assert_eq!(c.ask, dec!(0.2));
        // beyond -threshold the unwinding side is free
        assert_eq!(credit("slippery", 30).ask, dec!(0));
        // exponential: 0.2 at 20 to 0.05 at 100 passes 0.1 at 60
        let c = credit("slippery", 60);
        assert!((c.bid - dec!(0.1)).abs() < dec!(0.000001));
        let c = credit("slippery", -100);
        assert!((c.ask - dec!(0.05)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_exponential_credit_endpoints() {
        let at_lo = exponential_credit(dec!(0.2), dec!(1), 20, 100, 20).unwrap();
        let at_hi = exponential_credit(dec!(0.2), dec!(1), 20, 100, 100).unwrap();
        assert!((at_lo - dec!(0.2)).abs() < dec!(0.000001));
        assert!((at_hi - dec!(1)).abs() < dec!(0.000001));
        assert!(exponential_credit(dec!(0), dec!(1), 20, 100, 50).is_err());
    }

    #[test]
    fn test_linear_deprecate_volume() {
        assert_eq!(volume("linear-deprecate", 0), VolumePair::uniform(10));
        assert_eq!(volume("linear-deprecate", 50), VolumePair { bid: 5, ask: 10 });
        assert_eq!(volume("linear-deprecate", -75), VolumePair { bid: 10, ask: 2 });
        assert_eq!(volume("linear-deprecate", 100), VolumePair { bid: 0, ask: 10 });
    }

    #[test]
    fn test_linear_advocate_volume() {
        // floor(10 * 0.5 + 50) = 55
        assert_eq!(volume("linear-advocate", 50), VolumePair { bid: 10, ask: 55 });
        assert_eq!(volume("linear-advocate", -100), VolumePair { bid: 100, ask: 10 });
        assert_eq!(volume("linear-advocate", 0), VolumePair::uniform(10));
        // floor(10 * 0.97 + 3) = 12
        assert_eq!(volume("linear-advocate", 3).ask, 12);
    }
}

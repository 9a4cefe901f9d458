//! Black-Scholes closed forms for European options.
//!
//! Callers validate inputs; these functions assume `s > 0`, `k > 0`,
//! `t > 0` and `sigma > 0`.

/// Standard normal cumulative distribution function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Error function, Abramowitz and Stegun 7.1.26 (|error| < 1.5e-7).
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let poly = ((((a5 * t + a4) * t + a3) * t + a2) * t + a1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

fn d1_d2(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> (f64, f64) {
    let vol_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

pub fn call_value(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, t, r, sigma);
    s * normal_cdf(d1) - k * (-r * t).exp() * normal_cdf(d2)
}

pub fn put_value(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, t, r, sigma);
    k * (-r * t).exp() * normal_cdf(-d2) - s * normal_cdf(-d1)
}

pub fn call_delta(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    let (d1, _) = d1_d2(s, k, t, r, sigma);
    normal_cdf(d1)
}

pub fn put_delta(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    call_delta(s, k, t, r, sigma) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-4;

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.9750021).abs() < 1e-6);
        assert!((normal_cdf(-1.96) - 0.0249979).abs() < 1e-6);
    }

    #[test]
    fn test_textbook_values() {
        // S=100, K=100, T=1, r=5%, vol=20%
        assert!((call_value(100.0, 100.0, 1.0, 0.05, 0.2) - 10.450584).abs() < TOL);
        assert!((put_value(100.0, 100.0, 1.0, 0.05, 0.2) - 5.573526).abs() < TOL);
        assert!((call_delta(100.0, 100.0, 1.0, 0.05, 0.2) - 0.636831).abs() < TOL);
    }

    #[test]
    fn test_put_call_parity() {
        let (s, k, t, r, v) = (100.0, 95.0, 0.25, 0.03, 0.4);
        let lhs = call_value(s, k, t, r, v) - put_value(s, k, t, r, v);
        let rhs = s - k * (-r * t).exp();
        assert!((lhs - rhs).abs() < 1e-4);
    }

    #[test]
    fn test_high_vol_values() {
        let (k, t, r, v) = (100.0, 0.1, 0.03, 3.0);
        assert!((call_value(100.0, k, t, r, v) - 36.569685).abs() < TOL);
        assert!((call_value(100.2, k, t, r, v) - 36.706460).abs() < TOL);
        assert!((put_value(100.0, k, t, r, v) - 36.270134).abs() < TOL);
        assert!((call_delta(100.0, k, t, r, v) - 0.683498).abs() < TOL);
        assert!((put_delta(100.0, k, t, r, v) + 0.316502).abs() < TOL);
    }
}

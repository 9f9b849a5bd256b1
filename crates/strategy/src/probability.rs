//! Model probability (§4.3): next-day high modeled as Gaussian
//! `N(forecast_high_f, forecast_stddev_f)`,
//! `p_model = P(X >= T) = 0.5 * (1 - erf((T - mu) / (sigma * sqrt(2))))`.
//!
//! Rust's standard library has no `erf`; this uses the Abramowitz & Stegun
//! 7.1.26 rational approximation (max absolute error ~1.5e-7), which is
//! exact enough for cent-denominated pricing.

use domain::Direction;

pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

/// `P(X >= T)` for `X ~ N(mu, sigma)`. Returns `None` if `sigma <= 0`
/// (caller must treat this as `HIGH_UNCERTAINTY`, §4.3).
pub fn p_above(threshold_f: f64, mu: f64, sigma: f64) -> Option<f64> {
    if sigma <= 0.0 {
        return None;
    }
    Some(0.5 * (1.0 - erf((threshold_f - mu) / (sigma * std::f64::consts::SQRT_2))))
}

/// Model probability that the contract settles YES, for either direction.
pub fn p_model(threshold_f: f64, direction: Direction, mu: f64, sigma: f64) -> Option<f64> {
    let above = p_above(threshold_f, mu, sigma)?;
    Some(match direction {
        Direction::Above => above,
        Direction::Below => 1.0 - above,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erf_is_odd_and_bounded() {
        assert!((erf(0.0)).abs() < 1e-6);
        assert!((erf(10.0) - 1.0).abs() < 1e-6);
        assert!((erf(-10.0) + 1.0).abs() < 1e-6);
        assert!((erf(1.0) + erf(-1.0)).abs() < 1e-6);
    }

    #[test]
    fn s1_happy_path_matches_scenario() {
        // S1: high=72, sigma=3, threshold=70 -> p_model ~ 0.748
        let p = p_above(70.0, 72.0, 3.0).unwrap();
        assert!((p - 0.748).abs() < 0.01, "p={p}");
    }

    #[test]
    fn zero_sigma_returns_none() {
        assert!(p_above(70.0, 72.0, 0.0).is_none());
    }

    #[test]
    fn below_direction_is_complement_of_above() {
        let above = p_model(70.0, Direction::Above, 72.0, 3.0).unwrap();
        let below = p_model(70.0, Direction::Below, 72.0, 3.0).unwrap();
        assert!((above + below - 1.0).abs() < 1e-9);
    }

    #[test]
    fn at_threshold_probability_is_half() {
        let p = p_above(50.0, 50.0, 3.0).unwrap();
        assert!((p - 0.5).abs() < 1e-6);
    }
}

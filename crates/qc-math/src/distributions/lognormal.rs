//! Lognormal helpers shared by the closed-form pricers.

use qc_core::{OptionType, Real};

use super::normal::normal_cdf;

/// Black–Scholes `d1` and `d2` with a continuous dividend yield.
///
/// `d1 = (ln(S/K) + (r − q + σ²/2)T) / (σ√T)`, `d2 = d1 − σ√T`.
///
/// The caller guarantees `σ√T > 0`; the degenerate limit is handled by the
/// pricers, not here.
#[inline]
pub fn d1_d2(
    spot: Real,
    strike: Real,
    rate: Real,
    dividend_yield: Real,
    volatility: Real,
    maturity: Real,
) -> (Real, Real) {
    let std_dev = volatility * maturity.sqrt();
    let d1 = ((spot / strike).ln() + (rate - dividend_yield + 0.5 * volatility * volatility) * maturity)
        / std_dev;
    (d1, d1 - std_dev)
}

/// Undiscounted `E[(φ(X − K))⁺]` for `ln X ~ N(mean_log, var_log)`.
///
/// With `var_log = 0` the variable is deterministic and the intrinsic value
/// of `e^{mean_log}` is returned.
pub fn lognormal_expectation(
    mean_log: Real,
    var_log: Real,
    strike: Real,
    option_type: OptionType,
) -> Real {
    let phi = option_type.sign();
    let sd = var_log.max(0.0).sqrt();
    if sd < 1e-15 {
        return option_type.payoff(mean_log.exp(), strike);
    }
    let forward = (mean_log + 0.5 * var_log).exp();
    let d1 = (mean_log - strike.ln() + var_log) / sd;
    let d2 = d1 - sd;
    let value = phi * (forward * normal_cdf(phi * d1) - strike * normal_cdf(phi * d2));
    value.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d1_d2_reference() {
        // S=100, K=100, r=5%, q=0, σ=20%, T=1
        let (d1, d2) = d1_d2(100.0, 100.0, 0.05, 0.0, 0.2, 1.0);
        assert!((d1 - 0.35).abs() < 1e-12, "d1 = {d1}");
        assert!((d2 - 0.15).abs() < 1e-12, "d2 = {d2}");
    }

    #[test]
    fn lognormal_expectation_matches_black_scholes() {
        // Terminal spot under Q: ln S_T ~ N(ln S + (r − σ²/2)T, σ²T)
        let (s, k, r, v, t): (Real, Real, Real, Real, Real) = (100.0, 100.0, 0.05, 0.2, 1.0);
        let mean = s.ln() + (r - 0.5 * v * v) * t;
        let call = (-r * t).exp() * lognormal_expectation(mean, v * v * t, k, OptionType::Call);
        assert!((call - 10.450_583_572_185_565).abs() < 1e-9, "call = {call}");
    }

    #[test]
    fn lognormal_parity() {
        let (mean, var, k) = (4.6, 0.04, 95.0);
        let c = lognormal_expectation(mean, var, k, OptionType::Call);
        let p = lognormal_expectation(mean, var, k, OptionType::Put);
        let fwd = (mean + 0.5 * var as Real).exp();
        assert!((c - p - (fwd - k)).abs() < 1e-10);
    }

    #[test]
    fn degenerate_variance_is_intrinsic() {
        let v = lognormal_expectation(100.0_f64.ln(), 0.0, 90.0, OptionType::Call);
        assert!((v - 10.0).abs() < 1e-10);
        assert_eq!(lognormal_expectation(100.0_f64.ln(), 0.0, 90.0, OptionType::Put), 0.0);
    }
}

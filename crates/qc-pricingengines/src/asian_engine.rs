//! Discretely monitored Asian options.
//!
//! The averaging dates are a subset of a uniform grid of `n_steps` steps over
//! `[0, T]`, given as 1-based step indices (`t_i = i·T/n_steps`). The
//! arithmetic average has no closed form; the geometric average is
//! lognormal and prices in closed form, which makes it the control variate
//! of the Monte Carlo engine.

use qc_core::{ensure, errors::Result, MarketScenario, OptionType, Real, Time};
use qc_math::lognormal_expectation;
use qc_methods::Path;
use serde::Serialize;

/// A discretely monitored Asian option on a single asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsianOption {
    option_type: OptionType,
    strike: Real,
    n_steps: usize,
    averaging_indices: Vec<usize>,
}

impl AsianOption {
    /// Validate and build an Asian option.
    ///
    /// `averaging_indices` defaults to every grid date `1..=n_steps`.
    ///
    /// # Errors
    /// `InvalidInput` unless `strike > 0`, `n_steps >= 1` and the indices are
    /// non-empty, strictly increasing and within `1..=n_steps`.
    pub fn new(
        option_type: OptionType,
        strike: Real,
        n_steps: usize,
        averaging_indices: Option<Vec<usize>>,
    ) -> Result<Self> {
        ensure!(strike.is_finite() && strike > 0.0, "k", strike, "strike must be positive and finite");
        ensure!(n_steps >= 1, "n_steps", n_steps, "at least one monitoring step is required");
        let averaging_indices = averaging_indices.unwrap_or_else(|| (1..=n_steps).collect());
        ensure!(
            !averaging_indices.is_empty(),
            "averaging_indices",
            averaging_indices,
            "at least one averaging date is required"
        );
        ensure!(
            averaging_indices.windows(2).all(|w| w[1] > w[0]),
            "averaging_indices",
            averaging_indices,
            "indices must be strictly increasing"
        );
        ensure!(
            averaging_indices[0] >= 1 && averaging_indices[averaging_indices.len() - 1] <= n_steps,
            "averaging_indices",
            averaging_indices,
            "indices must lie in 1..={n_steps}"
        );
        Ok(Self {
            option_type,
            strike,
            n_steps,
            averaging_indices,
        })
    }

    /// Call or put.
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Strike.
    pub fn strike(&self) -> Real {
        self.strike
    }

    /// Number of grid steps.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// 1-based grid indices of the averaging dates.
    pub fn averaging_indices(&self) -> &[usize] {
        &self.averaging_indices
    }

    /// Averaging times for a given maturity.
    pub fn observation_times(&self, maturity: Time) -> Vec<Time> {
        let dt = maturity / self.n_steps as Real;
        self.averaging_indices.iter().map(|&i| i as Real * dt).collect()
    }

    /// Arithmetic mean of the path at the averaging dates.
    pub fn arithmetic_average(&self, path: &Path) -> Real {
        self.averaging_indices.iter().map(|&i| path.values[i]).sum::<Real>()
            / self.averaging_indices.len() as Real
    }

    /// Geometric mean of the path at the averaging dates.
    pub fn geometric_average(&self, path: &Path) -> Real {
        (self.averaging_indices.iter().map(|&i| path.values[i].ln()).sum::<Real>()
            / self.averaging_indices.len() as Real)
            .exp()
    }

    /// Undiscounted arithmetic-average payoff.
    pub fn arithmetic_payoff(&self, path: &Path) -> Real {
        self.option_type.payoff(self.arithmetic_average(path), self.strike)
    }

    /// Undiscounted geometric-average payoff.
    pub fn geometric_payoff(&self, path: &Path) -> Real {
        self.option_type.payoff(self.geometric_average(path), self.strike)
    }
}

/// Closed-form price of the geometric-average Asian option.
///
/// With averaging times `t_1 < … < t_m`, `ln G` is normal with mean
/// `ln S0 + (r − q − σ²/2)·t̄` and variance `σ²/m² · Σ_i Σ_j min(t_i, t_j)`;
/// the price is the discounted lognormal expectation.
pub fn geometric_asian_price(scenario: &MarketScenario, option: &AsianOption) -> Real {
    let times = option.observation_times(scenario.maturity());
    let m = times.len() as Real;
    let sigma = scenario.volatility();
    let mean_time = times.iter().sum::<Real>() / m;
    // sorted times: min(t_i, t_j) summed over all pairs is Σ t_i (2(m − i) − 1)
    let pair_min_sum: Real = times
        .iter()
        .enumerate()
        .map(|(i, t)| t * (2.0 * (m - i as Real) - 1.0))
        .sum();
    let mean_log =
        scenario.spot().ln() + (scenario.rate() - scenario.dividend_yield() - 0.5 * sigma * sigma) * mean_time;
    let var_log = sigma * sigma * pair_min_sum / (m * m);
    scenario.discount_factor() * lognormal_expectation(mean_log, var_log, option.strike(), option.option_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qc_core::VanillaOption;

    use crate::analytic_european_engine::price;

    fn scenario() -> MarketScenario {
        MarketScenario::new(100.0, 0.02, 0.0, 1.0, 0.2).unwrap()
    }

    #[test]
    fn equally_spaced_closed_form() {
        // ln G ~ N(ln S0 + μ·T(n+1)/2n, σ²T(n+1)(2n+1)/6n²)
        let s = scenario();
        let n = 12usize;
        let opt = AsianOption::new(OptionType::Call, 100.0, n, None).unwrap();
        let nf = n as Real;
        let mean_log = 100.0_f64.ln() + (0.02 - 0.02) * (nf + 1.0) / (2.0 * nf);
        let var_log = 0.04 * (nf + 1.0) * (2.0 * nf + 1.0) / (6.0 * nf * nf);
        let expected = (-0.02_f64).exp() * lognormal_expectation(mean_log, var_log, 100.0, OptionType::Call);
        assert_relative_eq!(geometric_asian_price(&s, &opt), expected, max_relative = 1e-12);
    }

    #[test]
    fn single_date_at_maturity_is_european() {
        let s = MarketScenario::new(100.0, 0.03, 0.01, 0.5, 0.25).unwrap();
        for ty in [OptionType::Call, OptionType::Put] {
            let asian = AsianOption::new(ty, 105.0, 10, Some(vec![10])).unwrap();
            let vanilla = VanillaOption::new(ty, 105.0).unwrap();
            assert_relative_eq!(geometric_asian_price(&s, &asian), price(&s, &vanilla), max_relative = 1e-10);
        }
    }

    #[test]
    fn averaging_cheapens_the_call() {
        let s = scenario();
        let asian = AsianOption::new(OptionType::Call, 100.0, 50, None).unwrap();
        let vanilla = price(&s, &VanillaOption::call(100.0).unwrap());
        assert!(geometric_asian_price(&s, &asian) < vanilla);
    }

    #[test]
    fn averages_on_a_path() {
        let opt = AsianOption::new(OptionType::Call, 2.0, 3, Some(vec![1, 3])).unwrap();
        let path = Path {
            times: vec![0.0, 1.0, 2.0, 3.0],
            values: vec![9.0, 1.0, 100.0, 4.0],
        };
        assert_eq!(opt.arithmetic_average(&path), 2.5);
        assert_relative_eq!(opt.geometric_average(&path), 2.0, max_relative = 1e-15);
        assert_eq!(opt.arithmetic_payoff(&path), 0.5);
        assert!(opt.geometric_payoff(&path).abs() < 1e-15);
    }

    #[test]
    fn rejects_bad_indices() {
        assert!(AsianOption::new(OptionType::Call, 100.0, 4, Some(vec![])).is_err());
        assert!(AsianOption::new(OptionType::Call, 100.0, 4, Some(vec![0, 2])).is_err());
        assert!(AsianOption::new(OptionType::Call, 100.0, 4, Some(vec![2, 2])).is_err());
        assert!(AsianOption::new(OptionType::Call, 100.0, 4, Some(vec![3, 5])).is_err());
        assert!(AsianOption::new(OptionType::Call, 100.0, 0, None).is_err());
        assert!(AsianOption::new(OptionType::Call, -1.0, 4, None).is_err());
    }
}

//! Binomial (CRR) engine for European and American vanilla options, and
//! the one-step replicating portfolio.

use qc_core::{errors::Result, MarketScenario, Real, VanillaOption};
use qc_methods::{price_american, price_european, BinomialTree};
use serde::Serialize;
use tracing::debug;

/// Exercise style of a lattice-priced option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    /// Exercise at maturity only.
    European,
    /// Exercise at any tree node.
    American,
}

impl Exercise {
    /// `American` when `american` is true.
    pub fn from_is_american(american: bool) -> Self {
        if american {
            Exercise::American
        } else {
            Exercise::European
        }
    }
}

/// CRR lattice price with `n_steps` steps.
///
/// # Errors
/// * `InvalidInput` if `n_steps == 0`.
/// * `ModelInvalid` if the risk-neutral probability leaves `(0, 1)`.
pub fn binomial_price(
    scenario: &MarketScenario,
    option: &VanillaOption,
    n_steps: usize,
    exercise: Exercise,
) -> Result<Real> {
    let tree = BinomialTree::cox_ross_rubinstein(
        scenario.spot(),
        scenario.rate(),
        scenario.dividend_yield(),
        scenario.volatility(),
        scenario.maturity(),
        n_steps,
    )?;
    let discount = (-scenario.rate() * tree.dt()).exp();
    let payoff = |s: Real| option.payoff(s);
    let value = match exercise {
        Exercise::European => price_european(&tree, &payoff, discount),
        Exercise::American => price_american(&tree, &payoff, discount),
    };
    debug!(n_steps, ?exercise, value, "crr priced");
    Ok(value)
}

/// Replicating portfolio over a single period of length `T`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplicationResult {
    /// Shares held at time 0.
    pub delta: Real,
    /// Cash held at time 0 (negative when borrowing).
    pub bond: Real,
    /// Portfolio value `Δ·S0 + B`.
    pub value: Real,
    /// Claim value in the up state.
    pub up_value: Real,
    /// Claim value in the down state.
    pub down_value: Real,
    /// Risk-neutral up probability.
    pub probability: Real,
}

/// One-period CRR replication of the option payoff.
///
/// With dividends reinvested, `Δ` shares grow to `Δ·e^{qT}` shares, so
/// `Δ = e^{-qT}(V_u − V_d)/(S_u − S_d)` and `B = e^{-rT}(V_u − Δ·e^{qT}·S_u)`.
/// The portfolio value equals the one-step risk-neutral price.
///
/// # Errors
/// `ModelInvalid` if the one-step probability leaves `(0, 1)`.
pub fn one_step_replication(scenario: &MarketScenario, option: &VanillaOption) -> Result<ReplicationResult> {
    let tree = BinomialTree::cox_ross_rubinstein(
        scenario.spot(),
        scenario.rate(),
        scenario.dividend_yield(),
        scenario.volatility(),
        scenario.maturity(),
        1,
    )?;
    let t = scenario.maturity();
    let (s_up, s_down) = (tree.underlying(1, 1), tree.underlying(1, 0));
    let (v_up, v_down) = (option.payoff(s_up), option.payoff(s_down));

    let share_growth = (scenario.dividend_yield() * t).exp();
    let delta = (v_up - v_down) / (s_up - s_down) / share_growth;
    let bond = scenario.discount_factor() * (v_up - delta * share_growth * s_up);

    Ok(ReplicationResult {
        delta,
        bond,
        value: delta * scenario.spot() + bond,
        up_value: v_up,
        down_value: v_down,
        probability: tree.probability_up(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytic_european_engine::price;
    use approx::assert_relative_eq;
    use qc_core::ErrorKind;

    fn scenario() -> MarketScenario {
        MarketScenario::new(100.0, 0.05, 0.02, 1.0, 0.2).unwrap()
    }

    #[test]
    fn converges_to_black_scholes() {
        let s = scenario();
        let opt = VanillaOption::call(100.0).unwrap();
        let bs = price(&s, &opt);
        let err = |n| (binomial_price(&s, &opt, n, Exercise::European).unwrap() - bs).abs();
        assert!(err(500) < err(50));
        assert!(err(1000) < 0.01, "error {}", err(1000));
    }

    #[test]
    fn american_dominates_european() {
        let s = scenario();
        for opt in [VanillaOption::call(90.0).unwrap(), VanillaOption::put(110.0).unwrap()] {
            let eu = binomial_price(&s, &opt, 200, Exercise::European).unwrap();
            let am = binomial_price(&s, &opt, 200, Exercise::American).unwrap();
            assert!(am >= eu - 1e-12, "{opt:?}: {am} < {eu}");
        }
    }

    #[test]
    fn replication_matches_one_step_tree() {
        let s = scenario();
        for opt in [VanillaOption::call(100.0).unwrap(), VanillaOption::put(105.0).unwrap()] {
            let rep = one_step_replication(&s, &opt).unwrap();
            let tree_value = binomial_price(&s, &opt, 1, Exercise::European).unwrap();
            assert_relative_eq!(rep.value, tree_value, max_relative = 1e-12);
            // the portfolio pays off the claim in both states
            let tree = BinomialTree::cox_ross_rubinstein(100.0, 0.05, 0.02, 0.2, 1.0, 1).unwrap();
            let growth_q = (0.02_f64).exp();
            let growth_r = (0.05_f64).exp();
            let up = rep.delta * growth_q * tree.underlying(1, 1) + rep.bond * growth_r;
            let down = rep.delta * growth_q * tree.underlying(1, 0) + rep.bond * growth_r;
            assert_relative_eq!(up, rep.up_value, epsilon = 1e-10);
            assert_relative_eq!(down, rep.down_value, epsilon = 1e-10);
        }
    }

    #[test]
    fn degenerate_tree_propagates() {
        let s = MarketScenario::new(100.0, 0.5, 0.0, 1.0, 0.01).unwrap();
        let err = one_step_replication(&s, &VanillaOption::call(100.0).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelInvalid);
        let err = binomial_price(&scenario(), &VanillaOption::call(100.0).unwrap(), 0, Exercise::European)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}

//! Lattice methods for option pricing.
//!
//! * [`BinomialTree`] — recombining Cox–Ross–Rubinstein tree
//! * [`TimeGrid`] — grid of time points shared by trees and Monte Carlo paths
//! * [`price_european`] / [`price_american`] — backward-induction pricing

pub mod binomial_tree;

pub use binomial_tree::BinomialTree;

use qc_core::{ensure, errors::Result, Real, Time};

// ─── TimeGrid ─────────────────────────────────────────────────────────────────

/// A grid of time points `0 = t_0 < t_1 < … < t_n`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<Time>,
    dts: Vec<Time>,
}

impl TimeGrid {
    /// Uniform grid from 0 to `end` with `steps` intervals.
    ///
    /// # Errors
    /// `InvalidInput` if `steps == 0` or `end` is not positive.
    pub fn uniform(end: Time, steps: usize) -> Result<Self> {
        ensure!(steps >= 1, "n_steps", steps, "at least one time step is required");
        ensure!(end.is_finite() && end > 0.0, "t", end, "grid end must be positive");
        let dt = end / steps as Real;
        let mut times: Vec<Time> = (0..=steps).map(|i| i as Real * dt).collect();
        times[steps] = end;
        Ok(Self {
            times,
            dts: vec![dt; steps],
        })
    }

    /// Number of time points (= steps + 1).
    pub fn size(&self) -> usize {
        self.times.len()
    }

    /// Number of steps.
    pub fn steps(&self) -> usize {
        self.dts.len()
    }

    /// Time at index `i`.
    pub fn time(&self, i: usize) -> Time {
        self.times[i]
    }

    /// Step between index `i` and `i + 1`.
    pub fn dt(&self, i: usize) -> Time {
        self.dts[i]
    }

    /// Final time.
    pub fn end(&self) -> Time {
        self.times[self.times.len() - 1]
    }

    /// All time points.
    pub fn times(&self) -> &[Time] {
        &self.times
    }
}

// ─── Backward-induction pricing ───────────────────────────────────────────────

/// Price a European claim by backward induction on a binomial tree.
///
/// `payoff` maps the underlying at maturity to the claim value; `discount`
/// is the per-step discount factor `exp(−r·Δt)`.
pub fn price_european(tree: &BinomialTree, payoff: &dyn Fn(Real) -> Real, discount: Real) -> Real {
    roll_back(tree, payoff, discount, false)
}

/// Price an American claim: as [`price_european`], with the value at every
/// node floored by immediate exercise.
pub fn price_american(tree: &BinomialTree, payoff: &dyn Fn(Real) -> Real, discount: Real) -> Real {
    roll_back(tree, payoff, discount, true)
}

fn roll_back(tree: &BinomialTree, payoff: &dyn Fn(Real) -> Real, discount: Real, american: bool) -> Real {
    let n = tree.steps();
    let (pu, pd) = (tree.probability_up(), tree.probability_down());

    let mut values: Vec<Real> = (0..tree.size(n))
        .map(|j| payoff(tree.underlying(n, j)))
        .collect();

    // values[j + 1] is still the step-(i+1) value when values[j] is overwritten
    for i in (0..n).rev() {
        for j in 0..tree.size(i) {
            let hold = discount * (pd * values[j] + pu * values[j + 1]);
            values[j] = if american {
                hold.max(payoff(tree.underlying(i, j)))
            } else {
                hold
            };
        }
    }

    values[0]
}

// ─── Tests ────────────────────────────────────────────────────────────────────

//! Recombining Cox–Ross–Rubinstein binomial tree.
//!
//! Over `n` steps of length `Δt = T/n` the underlying moves up by
//! `u = exp(σ√Δt)` or down by `d = 1/u`. The risk-neutral up probability is
//! `p = (exp((r − q)Δt) − d) / (u − d)`; a tree with `p ∉ (0, 1)` admits
//! arbitrage and is rejected instead of clamped.

use qc_core::{ensure, ensure_model, errors::Result, Rate, Real, Time, Volatility};
use tracing::trace;

/// A recombining binomial tree.
///
/// Layer `i` has `i + 1` nodes; node `(i, j)` is the state after `j` up-moves
/// and `i − j` down-moves.
#[derive(Debug, Clone)]
pub struct BinomialTree {
    x0: Real,
    dt: Time,
    steps: usize,
    log_step: Real,
    pu: Real,
}

impl BinomialTree {
    /// Cox–Ross–Rubinstein tree.
    ///
    /// # Errors
    /// * `InvalidInput` if `steps == 0`.
    /// * `ModelInvalid` if the risk-neutral probability falls outside
    ///   `(0, 1)`, which happens when `Δt` is large relative to the volatility
    ///   and carry.
    pub fn cox_ross_rubinstein(
        spot: Real,
        rate: Rate,
        dividend_yield: Rate,
        volatility: Volatility,
        maturity: Time,
        steps: usize,
    ) -> Result<Self> {
        ensure!(steps >= 1, "n_steps", steps, "at least one time step is required");
        let dt = maturity / steps as Real;
        let log_step = volatility * dt.sqrt();
        let up = log_step.exp();
        let down = 1.0 / up;
        let growth = ((rate - dividend_yield) * dt).exp();
        let pu = (growth - down) / (up - down);
        ensure_model!(
            pu.is_finite() && pu > 0.0 && pu < 1.0,
            "crr",
            "risk-neutral probability p = {pu} outside (0, 1) for u = {up}, d = {down}, dt = {dt}"
        );
        trace!(steps, up, down, pu, "crr tree built");
        Ok(Self {
            x0: spot,
            dt,
            steps,
            log_step,
            pu,
        })
    }

    /// Number of time steps.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Time increment per step.
    pub fn dt(&self) -> Time {
        self.dt
    }

    /// Initial underlying value.
    pub fn x0(&self) -> Real {
        self.x0
    }

    /// Up multiplier `u`.
    pub fn up(&self) -> Real {
        self.log_step.exp()
    }

    /// Down multiplier `d = 1/u`.
    pub fn down(&self) -> Real {
        (-self.log_step).exp()
    }

    /// Risk-neutral up probability `p`.
    pub fn probability_up(&self) -> Real {
        self.pu
    }

    /// `1 − p`.
    pub fn probability_down(&self) -> Real {
        1.0 - self.pu
    }

    /// Number of nodes at step `i`.
    pub fn size(&self, i: usize) -> usize {
        i + 1
    }

    /// Underlying at node `(i, j)`: `x0 · u^j · d^(i−j)`.
    pub fn underlying(&self, i: usize, j: usize) -> Real {
        let moves = 2.0 * j as Real - i as Real;
        self.x0 * (moves * self.log_step).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qc_core::ErrorKind;

    #[test]
    fn crr_parameters() {
        let tree = BinomialTree::cox_ross_rubinstein(100.0, 0.05, 0.01, 0.2, 1.0, 4).unwrap();
        let dt: Real = 0.25;
        let u = (0.2 * dt.sqrt()).exp();
        assert_relative_eq!(tree.up(), u, max_relative = 1e-14);
        assert_relative_eq!(tree.up() * tree.down(), 1.0, max_relative = 1e-14);
        let p = ((0.04 * dt).exp() - 1.0 / u) / (u - 1.0 / u);
        assert_relative_eq!(tree.probability_up(), p, max_relative = 1e-12);
        assert_relative_eq!(tree.underlying(2, 1), 100.0, max_relative = 1e-14);
        assert_relative_eq!(tree.underlying(4, 4), 100.0 * u.powi(4), max_relative = 1e-12);
    }

    #[test]
    fn tree_is_martingale_under_carry() {
        let tree = BinomialTree::cox_ross_rubinstein(100.0, 0.05, 0.02, 0.3, 2.0, 1).unwrap();
        let expected = tree.probability_up() * tree.underlying(1, 1)
            + tree.probability_down() * tree.underlying(1, 0);
        assert_relative_eq!(expected, 100.0 * (0.03 * 2.0_f64).exp(), max_relative = 1e-12);
    }

    #[test]
    fn degenerate_probability_is_model_invalid() {
        // strong drift, tiny vol, one long step: growth exceeds u
        let err = BinomialTree::cox_ross_rubinstein(100.0, 0.5, 0.0, 0.01, 1.0, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelInvalid);
    }

    #[test]
    fn zero_steps_is_invalid_input() {
        let err = BinomialTree::cox_ross_rubinstein(100.0, 0.05, 0.0, 0.2, 1.0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}

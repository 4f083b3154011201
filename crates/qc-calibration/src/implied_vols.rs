//! Strike-by-strike implied volatilities with per-point failures.

use qc_core::{
    config::ImpliedVolConfig,
    ensure,
    errors::{ErrorKind, Result},
    MarketInputs, OptionType, Real, VanillaOption, Volatility,
};
use qc_pricingengines::implied_volatility;
use serde::Serialize;
use tracing::{debug, warn};

/// Implied volatilities of one maturity, one entry per input strike.
///
/// A price that cannot be inverted (outside the no-arbitrage bounds, a
/// non-positive strike, solver exhaustion) yields an `Err` at its index
/// while every other point is still computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpliedVolBatch {
    /// Input strikes, in input order.
    pub strikes: Vec<Real>,
    /// Per-strike outcome.
    pub results: Vec<Result<Volatility>>,
}

impl ImpliedVolBatch {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// `true` when the batch has no points.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// `true` when every point was inverted.
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|r| r.is_ok())
    }

    /// Volatilities with `NaN` at failed points.
    pub fn vols_or_nan(&self) -> Vec<Real> {
        self.results.iter().map(|r| *r.as_ref().unwrap_or(&Real::NAN)).collect()
    }

    /// Index and kind of every failed point.
    pub fn failures(&self) -> Vec<(usize, ErrorKind)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e.kind())))
            .collect()
    }

    /// Strikes and volatilities of the successful points, ready for a smile fit.
    pub fn successful_points(&self) -> (Vec<Real>, Vec<Volatility>) {
        self.strikes
            .iter()
            .zip(&self.results)
            .filter_map(|(k, r)| r.as_ref().ok().map(|v| (*k, *v)))
            .unzip()
    }
}

/// Invert `prices` strike by strike.
///
/// # Errors
/// `InvalidInput` only for batch-level problems: empty input or strikes and
/// prices of different lengths. Per-point failures are reported inside the
/// batch.
pub fn implied_vols_from_prices(
    strikes: &[Real],
    prices: &[Real],
    market: &MarketInputs,
    option_type: OptionType,
    config: &ImpliedVolConfig,
) -> Result<ImpliedVolBatch> {
    ensure!(!strikes.is_empty(), "strikes", strikes, "at least one strike is required");
    ensure!(
        prices.len() == strikes.len(),
        "prices",
        prices.len(),
        "expected {} prices, one per strike",
        strikes.len()
    );

    let results: Vec<Result<Volatility>> = strikes
        .iter()
        .zip(prices)
        .enumerate()
        .map(|(i, (&strike, &price))| {
            let outcome = VanillaOption::new(option_type, strike)
                .and_then(|option| implied_volatility(market, &option, price, config));
            if let Err(err) = &outcome {
                warn!(index = i, strike, price, error = %err, "implied vol failed");
            }
            outcome
        })
        .collect();

    let batch = ImpliedVolBatch {
        strikes: strikes.to_vec(),
        results,
    };
    debug!(points = batch.len(), failed = batch.failures().len(), "implied vol batch");
    Ok(batch)
}

//! Monte Carlo engine for path-dependent payoffs.
//!
//! Each call draws its own seeded normal matrix, maps every row to a sample
//! (a GBM path for Asians, correlated terminal values for baskets), and
//! evaluates the discounted target payoff together with any controls. With
//! antithetic pairing the two payoffs of a pair are averaged first, so the
//! standard error is computed over independent samples.
//!
//! Control variates are fitted by regression (see
//! [`qc_methods::monte_carlo::control_variate`]):
//!
//! | payoff | controls (known mean) |
//! |---|---|
//! | Asian | geometric Asian (closed form), discounted `S_T` (`S0·e^{-qT}`) |
//! | basket | geometric basket (closed form), discounted `wᵀS_T` (`e^{-rT} Σ w_i F_i`) |

use qc_core::{
    config::MonteCarloConfig,
    ensure,
    errors::Result,
    MarketScenario, Real,
};
use qc_math::{
    draw_normals,
    statistics::{mean_confidence_interval, MeanEstimate},
    SamplingMethod,
};
use qc_methods::{
    control_variate_adjust, CorrelatedTerminalGenerator, GbmPathGenerator, MonteCarloModel, Path,
    TimeGrid,
};
use serde::Serialize;
use tracing::debug;

use crate::asian_engine::{geometric_asian_price, AsianOption};
use crate::basket_engine::{
    check_dimensions, discounted_linear_basket_mean, geometric_basket_price, BasketMarket, BasketOption,
};

/// Which control variates to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlVariate {
    /// Plain estimator.
    #[default]
    None,
    /// The geometric closed-form analogue.
    Geometric,
    /// The geometric analogue plus the discounted underlying (terminal spot
    /// or linear basket).
    GeometricWithExtra,
}

/// Monte Carlo run settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McSettings {
    /// Number of simulated paths, mirrors included.
    pub n_paths: usize,
    /// Sampling scheme.
    pub sampling: SamplingMethod,
    /// Pair every draw with its mirror (implied by `SamplingMethod::Antithetic`).
    pub antithetic: bool,
    /// Seed; `None` resolves to the default seed.
    pub seed: Option<u64>,
    /// Control variates.
    pub control_variate: ControlVariate,
    /// Two-sided confidence level of the interval.
    pub confidence_level: Real,
    /// Ridge added to the control covariance.
    pub ridge: Real,
}

impl Default for McSettings {
    fn default() -> Self {
        Self::from_config(&MonteCarloConfig::default())
    }
}

impl McSettings {
    /// Defaults with the confidence level and ridge of `config`.
    pub fn from_config(config: &MonteCarloConfig) -> Self {
        Self {
            n_paths: 20_000,
            sampling: SamplingMethod::Plain,
            antithetic: false,
            seed: None,
            control_variate: ControlVariate::None,
            confidence_level: config.confidence_level,
            ridge: config.ridge,
        }
    }

    fn pairs(&self) -> bool {
        self.antithetic || self.sampling == SamplingMethod::Antithetic
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.n_paths >= 2,
            "n_paths",
            self.n_paths,
            "at least 2 paths are required for a standard error"
        );
        if self.pairs() {
            ensure!(
                self.n_paths % 2 == 0 && self.n_paths >= 4,
                "n_paths",
                self.n_paths,
                "antithetic pairing needs an even path count of at least 4"
            );
        }
        ensure!(
            self.confidence_level > 0.0 && self.confidence_level < 1.0,
            "confidence_level",
            self.confidence_level,
            "must lie in (0, 1)"
        );
        ensure!(
            self.ridge.is_finite() && self.ridge >= 0.0,
            "ridge",
            self.ridge,
            "must be non-negative"
        );
        Ok(())
    }

    fn variance_reduction(&self) -> Vec<VarianceReduction> {
        let mut applied = Vec::new();
        if self.pairs() {
            applied.push(VarianceReduction::Antithetic);
        }
        match self.sampling {
            SamplingMethod::LatinHypercube => applied.push(VarianceReduction::LatinHypercube),
            SamplingMethod::Sobol { .. } | SamplingMethod::Halton { .. } => {
                applied.push(VarianceReduction::QuasiMonteCarlo)
            }
            SamplingMethod::Plain | SamplingMethod::Antithetic => {}
        }
        if self.control_variate != ControlVariate::None {
            applied.push(VarianceReduction::ControlVariate);
        }
        applied
    }
}

/// Variance-reduction technique applied to an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceReduction {
    /// Mirrored draws.
    Antithetic,
    /// Latin Hypercube stratification.
    LatinHypercube,
    /// Sobol or Halton points.
    QuasiMonteCarlo,
    /// Regression control variates.
    ControlVariate,
}

/// How much the control variates helped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlVariateDiagnostics {
    /// Control names, in `beta` order.
    pub controls: Vec<String>,
    /// Known expectation of each control.
    pub control_means: Vec<Real>,
    /// Regression coefficients.
    pub beta: Vec<Real>,
    /// Plain estimator on the same samples.
    pub baseline: MeanEstimate,
    /// `sd_baseline / sd_adjusted`.
    pub variance_reduction_ratio: Real,
}

/// Monte Carlo price estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McEstimate {
    /// Point estimate.
    pub mean: Real,
    /// Standard error of the mean.
    pub std_error: Real,
    /// Lower end of the confidence interval.
    pub ci_low: Real,
    /// Upper end of the confidence interval.
    pub ci_high: Real,
    /// Confidence level of the interval.
    pub confidence_level: Real,
    /// Simulated paths, mirrors included.
    pub n_paths: usize,
    /// Independent samples behind the standard error.
    pub n_samples: usize,
    /// Seed actually used.
    pub seed_effective: u64,
    /// Techniques applied, in order.
    pub variance_reduction: Vec<VarianceReduction>,
    /// Present when control variates were used.
    pub diagnostics: Option<ControlVariateDiagnostics>,
}

/// A path-dependent pricing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "payoff", rename_all = "snake_case")]
pub enum PathDependentRequest {
    /// Arithmetic-average Asian option.
    Asian {
        /// Single-asset scenario.
        scenario: MarketScenario,
        /// Option terms.
        option: AsianOption,
    },
    /// Arithmetic basket option.
    Basket {
        /// Basket market data.
        market: BasketMarket,
        /// Option terms.
        option: BasketOption,
    },
}

/// Price a path-dependent payoff by Monte Carlo.
///
/// # Errors
/// * `InvalidInput` for `n_paths < 2`, since one path has no standard
///   error. With antithetic pairing `n_paths` must also be even and at
///   least 4, so that two independent pairs remain. Also for a bad
///   confidence level or mismatched basket dimensions.
/// * `ModelInvalid` if the correlation factorisation or the control
///   regression fails.
pub fn price_path_dependent(request: &PathDependentRequest, settings: &McSettings) -> Result<McEstimate> {
    match request {
        PathDependentRequest::Asian { scenario, option } => price_asian(scenario, option, settings),
        PathDependentRequest::Basket { market, option } => price_basket(market, option, settings),
    }
}

/// Arithmetic Asian option by Monte Carlo.
pub fn price_asian(scenario: &MarketScenario, option: &AsianOption, settings: &McSettings) -> Result<McEstimate> {
    settings.validate()?;
    let grid = TimeGrid::uniform(scenario.maturity(), option.n_steps())?;
    let generator = GbmPathGenerator::new(
        scenario.spot(),
        scenario.rate(),
        scenario.dividend_yield(),
        scenario.volatility(),
        grid,
    );
    let draw = draw_normals(settings.n_paths, option.n_steps(), settings.sampling, settings.seed, settings.pairs())?;
    let df = scenario.discount_factor();

    let mut model = MonteCarloModel::new(generator).with_pricer(move |p: &Path| df * option.arithmetic_payoff(p));
    let mut controls = Vec::new();
    if settings.control_variate != ControlVariate::None {
        model = model.with_pricer(move |p: &Path| df * option.geometric_payoff(p));
        controls.push(("geometric_asian", geometric_asian_price(scenario, option)));
    }
    if settings.control_variate == ControlVariate::GeometricWithExtra {
        model = model.with_pricer(move |p: &Path| df * p.back());
        controls.push((
            "discounted_terminal_spot",
            scenario.spot() * scenario.dividend_discount_factor(),
        ));
    }

    let columns = model.simulate(&draw)?;
    estimate(&columns, &controls, settings, draw.seed_effective)
}

/// Arithmetic basket option by Monte Carlo.
pub fn price_basket(market: &BasketMarket, option: &BasketOption, settings: &McSettings) -> Result<McEstimate> {
    settings.validate()?;
    check_dimensions(market, option)?;
    let generator = CorrelatedTerminalGenerator::new(
        market.spots(),
        market.vols(),
        market.dividend_yields(),
        market.rate(),
        market.maturity(),
        market.correlation(),
    )?;
    let draw = draw_normals(settings.n_paths, market.n_assets(), settings.sampling, settings.seed, settings.pairs())?;
    let df = market.discount_factor();

    let mut model =
        MonteCarloModel::new(generator).with_pricer(move |s: &Vec<Real>| df * option.arithmetic_payoff(s));
    let mut controls = Vec::new();
    if settings.control_variate != ControlVariate::None {
        model = model.with_pricer(move |s: &Vec<Real>| df * option.geometric_payoff(s));
        controls.push(("geometric_basket", geometric_basket_price(market, option)?));
    }
    if settings.control_variate == ControlVariate::GeometricWithExtra {
        model = model.with_pricer(move |s: &Vec<Real>| df * option.arithmetic_basket(s));
        controls.push(("discounted_linear_basket", discounted_linear_basket_mean(market, option)));
    }

    let columns = model.simulate(&draw)?;
    estimate(&columns, &controls, settings, draw.seed_effective)
}

fn estimate(
    columns: &[Vec<Real>],
    controls: &[(&str, Real)],
    settings: &McSettings,
    seed_effective: u64,
) -> Result<McEstimate> {
    let target = &columns[0];
    let baseline = mean_confidence_interval(target, settings.confidence_level)?;

    let (reported, diagnostics) = if controls.is_empty() {
        (baseline, None)
    } else {
        let means: Vec<Real> = controls.iter().map(|(_, m)| *m).collect();
        let fit = control_variate_adjust(target, &columns[1..], &means, settings.ridge)?;
        let adjusted = mean_confidence_interval(&fit.adjusted, settings.confidence_level)?;
        let diagnostics = ControlVariateDiagnostics {
            controls: controls.iter().map(|(name, _)| name.to_string()).collect(),
            control_means: means,
            beta: fit.beta,
            baseline,
            variance_reduction_ratio: fit.variance_reduction_ratio,
        };
        (adjusted, Some(diagnostics))
    };

    debug!(
        mean = reported.mean,
        std_error = reported.std_error,
        n_samples = reported.n,
        seed_effective,
        "monte carlo estimate"
    );
    Ok(McEstimate {
        mean: reported.mean,
        std_error: reported.std_error,
        ci_low: reported.ci_low,
        ci_high: reported.ci_high,
        confidence_level: settings.confidence_level,
        n_paths: settings.n_paths,
        n_samples: reported.n,
        seed_effective,
        variance_reduction: settings.variance_reduction(),
        diagnostics,
    })
}

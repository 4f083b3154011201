//! Entry points wrapping every operation in a provenance envelope.
//!
//! An [`Engine`] owns an immutable [`EngineConfig`]. Each call captures
//! provenance, resolves the effective seed for stochastic operations from
//! the config default, runs inside an `info` span carrying the request id,
//! and returns the result as [`Enveloped`].

use qc_calibration::{
    fit_iv_smile, implied_vols_from_prices, iv_surface_total_variance, sanity_check_call_prices_convex_in_strike,
    FittedSmile, ForwardCurve, ImpliedVolBatch, IvSurface, SanityReport, SmileInterpolation, SmileSlice,
};
use qc_core::{
    errors::Result, ConfigError, EngineConfig, MarketInputs, MarketScenario, OptionType, Real, VanillaOption,
};
use qc_math::{draw, SampleDraw, SamplingMethod};
use qc_pricingengines::{
    analytic_european_engine, binomial_price, implied_volatility, one_step_replication, price_path_dependent,
    Exercise, GreeksResult, McEstimate, McSettings, PathDependentRequest, ReplicationResult,
};
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::provenance::{Enveloped, Provenance};

#[derive(Serialize)]
struct Request<'a, P: Serialize> {
    operation: &'a str,
    params: P,
}

/// The pricing and calibration engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Build an engine around a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine configured from defaults and `QUANTCAL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            config: EngineConfig::from_env()?,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seed a stochastic call runs with.
    pub fn resolve_seed(&self, seed: Option<u64>) -> u64 {
        seed.unwrap_or(self.config.sampling.default_seed)
    }

    /// Monte Carlo settings seeded with the configured confidence level,
    /// ridge, and default seed.
    pub fn mc_settings(&self) -> McSettings {
        McSettings {
            seed: Some(self.config.sampling.default_seed),
            ..McSettings::from_config(&self.config.monte_carlo)
        }
    }

    fn run<P, T>(
        &self,
        operation: &'static str,
        params: P,
        seed_effective: Option<u64>,
        compute: impl FnOnce() -> Result<T>,
    ) -> Result<Enveloped<T>>
    where
        P: Serialize,
    {
        let provenance = Provenance::capture(&Request { operation, params }, seed_effective)?;
        let span = info_span!(
            "request",
            operation,
            request_id = %provenance.request_id,
            seed_effective = ?seed_effective
        );
        let _enter = span.enter();
        let result = compute().map_err(|err| {
            warn!(error = %err, "request failed");
            err
        })?;
        info!(request_hash = %provenance.request_hash, "request completed");
        Ok(Enveloped { result, provenance })
    }

    /// Black–Scholes price and Greeks.
    pub fn greeks(&self, scenario: &MarketScenario, option: &VanillaOption) -> Result<Enveloped<GreeksResult>> {
        self.run("greeks", (scenario, option), None, || {
            Ok(analytic_european_engine::greeks(scenario, option))
        })
    }

    /// Black–Scholes price.
    pub fn price(&self, scenario: &MarketScenario, option: &VanillaOption) -> Result<Enveloped<Real>> {
        self.run("price", (scenario, option), None, || {
            Ok(analytic_european_engine::price(scenario, option))
        })
    }

    /// Implied volatility of a single price.
    pub fn implied_vol(
        &self,
        market: &MarketInputs,
        option: &VanillaOption,
        target_price: Real,
    ) -> Result<Enveloped<Real>> {
        self.run("implied_vol", (market, option, target_price), None, || {
            implied_volatility(market, option, target_price, &self.config.implied_vol)
        })
    }

    /// CRR lattice price.
    pub fn binomial(
        &self,
        scenario: &MarketScenario,
        option: &VanillaOption,
        n_steps: usize,
        exercise: Exercise,
    ) -> Result<Enveloped<Real>> {
        self.run("binomial", (scenario, option, n_steps, exercise), None, || {
            binomial_price(scenario, option, n_steps, exercise)
        })
    }

    /// One-period replicating portfolio.
    pub fn replication(
        &self,
        scenario: &MarketScenario,
        option: &VanillaOption,
    ) -> Result<Enveloped<ReplicationResult>> {
        self.run("one_step_replication", (scenario, option), None, || {
            one_step_replication(scenario, option)
        })
    }

    /// Seeded `(n × dim)` standard-normal sample matrix.
    pub fn draw(
        &self,
        n: usize,
        dim: usize,
        method: SamplingMethod,
        seed: Option<u64>,
    ) -> Result<Enveloped<SampleDraw>> {
        let seed = self.resolve_seed(seed);
        self.run("draw", (n, dim, method, seed), Some(seed), || draw(n, dim, method, Some(seed)))
    }

    /// Monte Carlo price of an Asian or basket option.
    pub fn price_path_dependent(
        &self,
        request: &PathDependentRequest,
        settings: &McSettings,
    ) -> Result<Enveloped<McEstimate>> {
        let settings = McSettings {
            seed: Some(self.resolve_seed(settings.seed)),
            ..settings.clone()
        };
        let seed = settings.seed;
        self.run("price_path_dependent", (request, &settings), seed, || {
            price_path_dependent(request, &settings)
        })
    }

    /// Implied vols strike by strike, with per-point failures.
    pub fn implied_vols_from_prices(
        &self,
        strikes: &[Real],
        prices: &[Real],
        market: &MarketInputs,
        option_type: OptionType,
    ) -> Result<Enveloped<ImpliedVolBatch>> {
        self.run("implied_vols_from_prices", (strikes, prices, market, option_type), None, || {
            implied_vols_from_prices(strikes, prices, market, option_type, &self.config.implied_vol)
        })
    }

    /// Smile fit with the configured extrapolation policy.
    pub fn fit_smile(
        &self,
        strikes: &[Real],
        vols: &[Real],
        kind: SmileInterpolation,
    ) -> Result<Enveloped<FittedSmile>> {
        self.run("fit_iv_smile", (strikes, vols, kind), None, || {
            fit_iv_smile(strikes, vols, kind, self.config.calibration.extrapolation)
        })
    }

    /// Total-variance surface.
    pub fn surface(&self, smiles: &[SmileSlice], forwards: ForwardCurve) -> Result<Enveloped<IvSurface>> {
        self.run("iv_surface_total_variance", (smiles, forwards), None, || {
            iv_surface_total_variance(smiles, forwards, &self.config.calibration)
        })
    }

    /// Advisory static-arbitrage check of call prices.
    pub fn sanity_check(&self, strikes: &[Real], call_prices: &[Real]) -> Result<Enveloped<SanityReport>> {
        self.run("sanity_check_call_prices", (strikes, call_prices), None, || {
            sanity_check_call_prices_convex_in_strike(strikes, call_prices, self.config.calibration.sanity_atol)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_core::{config::DEFAULT_SEED, ErrorKind};

    #[test]
    fn identical_requests_share_a_hash() {
        let engine = Engine::default();
        let s = MarketScenario::new(100.0, 0.05, 0.0, 1.0, 0.2).unwrap();
        let o = VanillaOption::call(100.0).unwrap();
        let a = engine.greeks(&s, &o).unwrap();
        let b = engine.greeks(&s, &o).unwrap();
        assert_eq!(a.result, b.result);
        assert_eq!(a.provenance.request_hash, b.provenance.request_hash);
        assert_ne!(a.provenance.request_id, b.provenance.request_id);
        assert_eq!(a.provenance.seed_effective, None);

        // the operation name is part of the request
        let p = engine.price(&s, &o).unwrap();
        assert_ne!(p.provenance.request_hash, a.provenance.request_hash);
        assert_eq!(p.result, a.result.price);
    }

    #[test]
    fn missing_seed_is_resolved_and_reported() {
        let engine = Engine::default();
        let d = engine.draw(8, 2, SamplingMethod::Plain, None).unwrap();
        assert_eq!(d.provenance.seed_effective, Some(DEFAULT_SEED));
        assert_eq!(d.result.seed_effective, DEFAULT_SEED);
        let explicit = engine.draw(8, 2, SamplingMethod::Plain, Some(DEFAULT_SEED)).unwrap();
        assert_eq!(explicit.result, d.result);
        assert_eq!(explicit.provenance.request_hash, d.provenance.request_hash);
    }

    #[test]
    fn configured_default_seed_is_used() {
        let mut config = EngineConfig::default();
        config.sampling.default_seed = 42;
        let engine = Engine::new(config).unwrap();
        assert_eq!(engine.resolve_seed(None), 42);
        assert_eq!(engine.mc_settings().seed, Some(42));
        let d = engine.draw(4, 1, SamplingMethod::LatinHypercube, None).unwrap();
        assert_eq!(d.provenance.seed_effective, Some(42));
    }

    #[test]
    fn errors_pass_through_unchanged() {
        let engine = Engine::default();
        let m = MarketInputs::new(100.0, 0.0, 0.0, 1.0).unwrap();
        let err = engine.implied_vol(&m, &VanillaOption::call(100.0).unwrap(), 150.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Convergence);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.monte_carlo.confidence_level = 1.5;
        assert!(Engine::new(config).is_err());
    }
}

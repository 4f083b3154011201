//! End-to-end scenarios through the engine facade.

use approx::assert_relative_eq;
use quantcal::{
    calibration::{fit_iv_smile_pchip, ForwardCurve, SmileSlice},
    core::{config::DEFAULT_SEED, MarketInputs, MarketScenario, OptionType, VanillaOption},
    math::SamplingMethod,
    pricingengines::{
        analytic_european_engine, AsianOption, BasketMarket, BasketOption, ControlVariate, Exercise, McSettings,
        PathDependentRequest,
    },
    Engine,
};

fn asian_request() -> PathDependentRequest {
    PathDependentRequest::Asian {
        scenario: MarketScenario::new(100.0, 0.02, 0.0, 1.0, 0.2).unwrap(),
        option: AsianOption::new(OptionType::Call, 100.0, 12, None).unwrap(),
    }
}

fn mc(engine: &Engine, n_paths: usize, seed: Option<u64>, control_variate: ControlVariate) -> McSettings {
    McSettings {
        n_paths,
        seed,
        control_variate,
        ..engine.mc_settings()
    }
}

#[test]
fn implied_vols_then_smile() {
    let engine = Engine::default();
    let strikes = [80.0, 90.0, 100.0, 110.0, 120.0];
    let prices = [21.9, 13.1, 6.2, 2.5, 0.9];
    let market = MarketInputs::new(100.0, 0.02, 0.01, 0.5).unwrap();
    let batch = engine
        .implied_vols_from_prices(&strikes, &prices, &market, OptionType::Call)
        .unwrap()
        .into_result();
    assert!(batch.is_complete());
    let vols = batch.vols_or_nan();
    assert_eq!(vols.len(), 5);
    for v in &vols {
        assert!(v.is_finite() && *v > 0.0 && *v < 2.0, "vol {v}");
    }

    let smile = fit_iv_smile_pchip(&strikes, &vols).unwrap();
    let v95 = smile.vol(95.0).unwrap();
    let (lo, hi) = (vols[1].min(vols[2]), vols[1].max(vols[2]));
    assert!(v95 >= lo && v95 <= hi, "{v95} not in [{lo}, {hi}]");

    // the recovered vols reprice the quotes
    for ((k, p), v) in strikes.iter().zip(prices).zip(&vols) {
        let s = market.with_volatility(*v).unwrap();
        let repriced = analytic_european_engine::price(&s, &VanillaOption::call(*k).unwrap());
        assert!((repriced - p).abs() < 1e-4, "K={k}: {repriced} vs {p}");
    }
}

#[test]
fn sanity_check_flags_convexity() {
    let engine = Engine::default();
    let convex = engine.sanity_check(&[90.0, 100.0, 110.0], &[12.0, 7.0, 3.5]).unwrap().result;
    assert!(convex.monotonic);
    assert!(convex.convex);

    let concave = engine.sanity_check(&[90.0, 100.0, 110.0], &[12.0, 9.0, 3.5]).unwrap().result;
    assert!(concave.monotonic);
    assert!(!concave.convex);
    assert_eq!(concave.violations.len(), 1);
}

#[test]
fn control_variate_beats_plain_estimator() {
    let engine = Engine::default();
    let request = asian_request();
    let plain = engine
        .price_path_dependent(&request, &mc(&engine, 20_000, Some(123), ControlVariate::None))
        .unwrap()
        .result;
    let cv = engine
        .price_path_dependent(&request, &mc(&engine, 20_000, Some(123), ControlVariate::Geometric))
        .unwrap()
        .result;
    assert!(cv.std_error < plain.std_error, "{} !< {}", cv.std_error, plain.std_error);
    assert!(cv.diagnostics.unwrap().variance_reduction_ratio > 1.0);
    assert!(cv.ci_low < cv.mean && cv.mean < cv.ci_high);
}

#[test]
fn binomial_converges_to_black_scholes() {
    let engine = Engine::default();
    let s = MarketScenario::new(100.0, 0.03, 0.01, 1.0, 0.25).unwrap();
    let put = VanillaOption::put(105.0).unwrap();
    let bs = engine.price(&s, &put).unwrap().result;
    let err = |n| (engine.binomial(&s, &put, n, Exercise::European).unwrap().result - bs).abs();
    assert!(err(500) < err(50));
    let american = engine.binomial(&s, &put, 500, Exercise::American).unwrap().result;
    let european = engine.binomial(&s, &put, 500, Exercise::European).unwrap().result;
    assert!(american >= european);
}

#[test]
fn identical_inputs_reproduce() {
    let engine = Engine::default();
    let request = asian_request();
    let settings = McSettings {
        sampling: SamplingMethod::Sobol { scramble: true },
        antithetic: true,
        ..mc(&engine, 4_096, Some(99), ControlVariate::GeometricWithExtra)
    };
    let a = engine.price_path_dependent(&request, &settings).unwrap();
    let b = engine.price_path_dependent(&request, &settings).unwrap();
    assert_relative_eq!(a.result.mean, b.result.mean, max_relative = 1e-9);
    assert_eq!(a.result.seed_effective, b.result.seed_effective);
    assert_eq!(a.provenance.request_hash, b.provenance.request_hash);
    assert_eq!(a.provenance.seed_effective, Some(99));
}

#[test]
fn omitted_seed_defaults_and_is_reported() {
    let engine = Engine::default();
    let out = engine
        .price_path_dependent(&asian_request(), &mc(&engine, 1_000, None, ControlVariate::None))
        .unwrap();
    assert_eq!(out.result.seed_effective, DEFAULT_SEED);
    assert_eq!(out.provenance.seed_effective, Some(DEFAULT_SEED));
}

#[test]
fn different_seeds_differ() {
    let engine = Engine::default();
    for method in [SamplingMethod::Plain, SamplingMethod::LatinHypercube] {
        let a = engine.draw(64, 3, method, Some(7)).unwrap().result;
        let b = engine.draw(64, 3, method, Some(8)).unwrap().result;
        let again = engine.draw(64, 3, method, Some(7)).unwrap().result;
        assert_ne!(a.values, b.values);
        assert_eq!(a.values, again.values);
    }
}

#[test]
fn basket_through_the_engine() {
    let engine = Engine::default();
    let request = PathDependentRequest::Basket {
        market: BasketMarket::new(
            vec![100.0, 100.0],
            vec![0.2, 0.3],
            vec![0.0, 0.0],
            0.02,
            1.0,
            vec![vec![1.0, 0.6], vec![0.6, 1.0]],
        )
        .unwrap(),
        option: BasketOption::new(OptionType::Call, 100.0, vec![0.5, 0.5]).unwrap(),
    };
    let out = engine
        .price_path_dependent(&request, &mc(&engine, 10_000, Some(5), ControlVariate::GeometricWithExtra))
        .unwrap()
        .result;
    assert!(out.mean > 0.0 && out.std_error > 0.0);
    assert_eq!(out.diagnostics.unwrap().controls, vec!["geometric_basket", "discounted_linear_basket"]);
}

#[test]
fn surface_from_calibrated_slices() {
    let engine = Engine::default();
    let strikes = [90.0, 100.0, 110.0];
    let smiles = vec![
        SmileSlice::new(0.5, strikes.to_vec(), vec![0.24, 0.2, 0.22]).unwrap(),
        SmileSlice::new(1.0, strikes.to_vec(), vec![0.25, 0.22, 0.23]).unwrap(),
    ];
    let surface = engine
        .surface(&smiles, ForwardCurve::new(100.0, 0.02, 0.01).unwrap())
        .unwrap()
        .result;
    let v = surface.vol(0.75, 100.0).unwrap();
    assert!(v > 0.19 && v < 0.23, "vol {v}");
    assert!(surface.calendar_violations().is_empty());
}

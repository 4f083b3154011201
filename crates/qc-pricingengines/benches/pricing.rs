use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qc_core::{MarketInputs, MarketScenario, OptionType, VanillaOption};
use qc_core::config::ImpliedVolConfig;
use qc_math::SamplingMethod;
use qc_pricingengines::{
    analytic_european_engine, implied_volatility, price_asian, AsianOption, ControlVariate, McSettings,
};

fn bench_analytic(c: &mut Criterion) {
    let scenario = MarketScenario::new(100.0, 0.05, 0.01, 1.0, 0.2).unwrap();
    let option = VanillaOption::call(105.0).unwrap();
    c.bench_function("bsm_greeks", |b| {
        b.iter(|| analytic_european_engine::greeks(black_box(&scenario), black_box(&option)))
    });

    let market = MarketInputs::new(100.0, 0.05, 0.01, 1.0).unwrap();
    let target = analytic_european_engine::price(&scenario, &option);
    let config = ImpliedVolConfig::default();
    c.bench_function("implied_vol_brent", |b| {
        b.iter(|| implied_volatility(black_box(&market), &option, black_box(target), &config).unwrap())
    });
}

fn bench_asian_mc(c: &mut Criterion) {
    let scenario = MarketScenario::new(100.0, 0.02, 0.0, 1.0, 0.2).unwrap();
    let option = AsianOption::new(OptionType::Call, 100.0, 12, None).unwrap();
    let mut group = c.benchmark_group("asian_mc_10k");
    group.sample_size(20);
    for (name, sampling, cv) in [
        ("plain", SamplingMethod::Plain, ControlVariate::None),
        ("sobol", SamplingMethod::Sobol { scramble: true }, ControlVariate::None),
        ("control_variate", SamplingMethod::Plain, ControlVariate::Geometric),
    ] {
        let settings = McSettings {
            n_paths: 10_000,
            sampling,
            seed: Some(123),
            control_variate: cv,
            ..McSettings::default()
        };
        group.bench_function(name, |b| b.iter(|| price_asian(&scenario, &option, &settings).unwrap()));
    }
    group.finish();
}

criterion_group!(benches, bench_analytic, bench_asian_mc);
criterion_main!(benches);

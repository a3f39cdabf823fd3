use bayesnet_core::{
    BayesNetError, Dataset, FallbackPolicy, Network, Sampler, SamplerConfig, VariableSpec,
};
use bayesnet_tests::{empirical_conditional, sprinkler_dataset, sprinkler_network};

fn fitted_sprinkler() -> Network {
    let mut net = sprinkler_network();
    net.fit(&sprinkler_dataset()).unwrap();
    net
}

#[test]
fn rain_round_trip_matches_fitted_conditional() {
    let net = fitted_sprinkler();
    let mut sampler = Sampler::with_config(
        &net,
        SamplerConfig {
            seed: 42,
            ..SamplerConfig::default()
        },
    );
    let samples = sampler.generate_samples("rain", 1000).unwrap();
    assert_eq!(samples.names().collect::<Vec<_>>(), vec!["cloudy", "rain"]);
    assert_eq!(samples.len(), 1000);

    let rain = net.cpt("rain").unwrap();
    for cloudy in [0, 1] {
        let fitted = rain.probability(&[cloudy], 1).unwrap();
        let empirical = empirical_conditional(&samples, "rain", 1, "cloudy", cloudy);
        assert!(
            (fitted - empirical).abs() < 0.05,
            "P(rain | cloudy={}) fitted {:.3} empirical {:.3}",
            cloudy,
            fitted,
            empirical
        );
    }
}

#[test]
fn resampled_data_reestimates_original_cpts() {
    let net = fitted_sprinkler();
    let mut sampler = Sampler::with_config(
        &net,
        SamplerConfig {
            seed: 7,
            ..SamplerConfig::default()
        },
    );
    let samples = sampler.generate_samples("wet", 5000).unwrap();

    let mut refit = sprinkler_network();
    refit.fit(&samples).unwrap();
    for name in ["cloudy", "sprinkler", "rain", "wet"] {
        let original = net.cpt(name).unwrap();
        let estimated = refit.cpt(name).unwrap();
        for (parents, row) in original.rows() {
            let new_row = estimated.row(parents).unwrap();
            for (p, q) in row.iter().zip(new_row) {
                assert!(
                    (p - q).abs() < 0.05,
                    "{} row {:?}: {} vs {}",
                    name,
                    parents,
                    p,
                    q
                );
            }
        }
    }
}

#[test]
fn fixed_seed_reproduces_dataset() {
    let net = fitted_sprinkler();
    let config = SamplerConfig {
        seed: 2024,
        ..SamplerConfig::default()
    };
    let first = Sampler::with_config(&net, config)
        .generate_samples("wet", 200)
        .unwrap();
    let second = Sampler::with_config(&net, config)
        .generate_samples("wet", 200)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn sample_one_covers_all_ancestors() {
    let net = fitted_sprinkler();
    let mut sampler = Sampler::new(&net);
    let sample = sampler.sample_one("wet").unwrap();
    let names: Vec<&str> = sample.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["cloudy", "rain", "sprinkler", "wet"]);
    // No wet grass without sprinkler or rain in the fitting data.
    if sample.get("sprinkler") == Some(0) && sample.get("rain") == Some(0) {
        assert_eq!(sample.get("wet"), Some(0));
    }
}

fn sparse_network() -> Network {
    // `b = 1, a = 1` never occurs, so `c` has no row for it.
    let data = Dataset::from_columns([
        ("a", vec![0, 0, 1, 1, 0]),
        ("b", vec![0, 1, 0, 0, 1]),
        ("c", vec![0, 1, 1, 0, 1]),
    ])
    .unwrap();
    let mut net = Network::build([
        VariableSpec::root("a"),
        VariableSpec::root("b"),
        VariableSpec::new("c", ["a", "b"]),
    ])
    .unwrap();
    net.fit(&data).unwrap();
    net
}

#[test]
fn strict_policy_surfaces_unobserved_combinations() {
    let net = sparse_network();
    let mut sampler = Sampler::new(&net);
    let err = sampler.generate_samples("c", 500).unwrap_err();
    match err {
        BayesNetError::UnobservedCombination {
            variable,
            parent_states,
        } => {
            assert_eq!(variable, "c");
            assert_eq!(parent_states, vec![1, 1]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn uniform_policy_fills_unobserved_combinations() {
    let net = sparse_network();
    let mut sampler = Sampler::with_config(
        &net,
        SamplerConfig {
            seed: 3,
            fallback: FallbackPolicy::Uniform,
        },
    );
    let samples = sampler.generate_samples("c", 500).unwrap();
    assert_eq!(samples.len(), 500);
    assert!(samples.column("c").unwrap().iter().all(|&s| s <= 1));
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_generation_is_reproducible() {
    let net = fitted_sprinkler();
    let sampler = Sampler::with_config(
        &net,
        SamplerConfig {
            seed: 11,
            ..SamplerConfig::default()
        },
    );
    let first = sampler.generate_samples_par("wet", 300).unwrap();
    let second = sampler.generate_samples_par("wet", 300).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 300);
}

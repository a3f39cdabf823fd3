use bayesnet_core::engine::cpt::ROW_SUM_TOLERANCE;
use bayesnet_core::{BayesNetError, Network, VariableSpec};
use bayesnet_tests::{lettered_network, sprinkler_dataset, sprinkler_network};

#[test]
fn lettered_network_topological_order_is_literal() {
    let net = lettered_network();
    assert_eq!(
        net.topological_names("W").unwrap(),
        vec!["B", "A", "T", "C", "S", "R", "W"]
    );
}

#[test]
fn every_variable_follows_its_parents() {
    let net = lettered_network();
    for target in net.names() {
        let order = net.topological_order(target).unwrap();
        assert_eq!(order.last().unwrap().name(), target);
        for (pos, variable) in order.iter().enumerate() {
            for parent in variable.parents() {
                let parent_pos = order.iter().position(|v| v.id() == *parent);
                assert!(
                    matches!(parent_pos, Some(p) if p < pos),
                    "{} scheduled before its parent",
                    variable.name()
                );
            }
        }
    }
}

#[test]
fn children_map_inverts_parent_references() {
    let net = lettered_network();
    let map = net.children_map();
    let children_of = |name: &str| {
        map.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c.clone())
            .unwrap()
    };
    assert_eq!(children_of("C"), vec!["R", "S"]);
    assert_eq!(children_of("T"), vec!["R"]);
    assert!(children_of("W").is_empty());
}

#[test]
fn cyclic_declaration_is_rejected() {
    let err = Network::build([
        VariableSpec::new("x", ["z"]),
        VariableSpec::new("y", ["x"]),
        VariableSpec::new("z", ["y"]),
    ])
    .unwrap_err();
    assert!(matches!(err, BayesNetError::CyclicGraph(_)));
    assert!(err.to_string().starts_with("cyclic graph"));
}

#[test]
fn fitted_sprinkler_cpts_are_stochastic() {
    let mut net = sprinkler_network();
    net.fit(&sprinkler_dataset()).unwrap();
    for variable in net.variables() {
        let cpt = variable.cpt().unwrap();
        assert_eq!(variable.cardinality(), Some(2));
        for (_, row) in cpt.rows() {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < ROW_SUM_TOLERANCE);
        }
    }
    assert_eq!(net.cpt("wet").unwrap().row_count(), 4);
}

#[test]
fn fitted_sprinkler_probabilities_match_counts() {
    let mut net = sprinkler_network();
    net.fit(&sprinkler_dataset()).unwrap();

    let rain = net.cpt("rain").unwrap();
    assert!((rain.probability(&[1], 0).unwrap() - 0.21).abs() < 1e-12);
    assert!((rain.probability(&[1], 1).unwrap() - 0.79).abs() < 1e-12);

    let wet = net.cpt("wet").unwrap();
    assert_eq!(wet.parent_names().collect::<Vec<_>>(), vec!["sprinkler", "rain"]);
    assert_eq!(wet.probability(&[0, 0], 1).unwrap(), 0.0);
}

#[test]
fn refitting_is_idempotent() {
    let data = sprinkler_dataset();
    let mut net = sprinkler_network();
    net.fit(&data).unwrap();
    let first = net.cpt("wet").unwrap().clone();
    net.fit(&data).unwrap();
    assert_eq!(net.cpt("wet").unwrap(), &first);
}

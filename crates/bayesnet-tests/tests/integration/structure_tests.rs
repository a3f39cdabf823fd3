use bayesnet_core::{
    learn_structure, learn_structure_with_diagnostics, BayesNetError, Dataset, EdgeMark,
    ResidualEdgePolicy,
};
use bayesnet_tests::{sprinkler_dataset, sprinkler_network};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn sprinkler_skeleton_is_recovered() {
    init_tracing();
    let (result, diagnostics) = learn_structure_with_diagnostics(&sprinkler_dataset()).unwrap();
    assert_eq!(
        result.graph.skeleton(),
        vec![
            ("cloudy", "sprinkler"),
            ("cloudy", "rain"),
            ("sprinkler", "wet"),
            ("rain", "wet"),
        ]
    );
    assert_eq!(diagnostics.edges_removed, 2);
    assert_eq!(diagnostics.max_conditioning_size_reached, 2);
}

#[test]
fn sprinkler_separating_sets_explain_removed_edges() {
    let result = learn_structure(&sprinkler_dataset()).unwrap();
    let sepsets = &result.separating_sets;
    assert_eq!(sepsets.get("sprinkler", "rain"), Some(vec!["cloudy"]));
    assert_eq!(sepsets.get("wet", "cloudy"), Some(vec!["sprinkler", "rain"]));
    assert_eq!(sepsets.get("cloudy", "rain"), None);
    assert_eq!(sepsets.len(), 2);
}

#[test]
fn wet_grass_collider_is_oriented() {
    let (result, diagnostics) = learn_structure_with_diagnostics(&sprinkler_dataset()).unwrap();
    let graph = &result.graph;
    assert_eq!(
        graph.directed_edges(),
        vec![("sprinkler", "wet"), ("rain", "wet")]
    );
    assert_eq!(
        graph.undirected_edges(),
        vec![("cloudy", "sprinkler"), ("cloudy", "rain")]
    );
    assert_eq!(graph.parents_of("wet").unwrap(), vec!["sprinkler", "rain"]);
    assert_eq!(
        graph.mark("rain", "cloudy").unwrap(),
        Some(EdgeMark::Undirected("cloudy", "rain"))
    );
    assert_eq!(diagnostics.colliders_oriented, 1);
    assert_eq!(diagnostics.orientation_conflicts, 0);
}

#[test]
fn learned_graph_seeds_the_generating_network() {
    let data = sprinkler_dataset();
    let graph = learn_structure(&data).unwrap().graph;
    assert!(matches!(
        graph.to_network(ResidualEdgePolicy::Reject),
        Err(BayesNetError::Validation(_))
    ));

    let mut learned = graph
        .to_network(ResidualEdgePolicy::RegistrationOrder)
        .unwrap();
    let mut reference = sprinkler_network();
    learned.fit(&data).unwrap();
    reference.fit(&data).unwrap();
    for name in ["cloudy", "sprinkler", "rain", "wet"] {
        assert_eq!(learned.cpt(name).unwrap(), reference.cpt(name).unwrap());
    }
}

#[test]
fn fully_independent_columns_produce_no_edges() {
    let n = 64;
    let bits = |shift: u32| (0..n).map(|i: u32| (i >> shift) & 1).collect::<Vec<_>>();
    let data = Dataset::from_columns([("a", bits(0)), ("b", bits(1)), ("c", bits(2))]).unwrap();
    let result = learn_structure(&data).unwrap();
    assert_eq!(result.graph.edge_count(), 0);
    assert_eq!(result.separating_sets.len(), 3);
}

use bayesnet_core::{
    conditional_mutual_information, independence_test, mutual_information, BayesNetError,
    IndependenceOracle,
};
use bayesnet_tests::sprinkler_dataset;

#[test]
fn cloudy_rain_mutual_information_is_literal() {
    let mi = mutual_information(&sprinkler_dataset(), "cloudy", "rain").unwrap();
    assert_eq!((mi * 1000.0).round() / 1000.0, 0.180);
}

#[test]
fn mutual_information_is_symmetric_and_nonnegative() {
    let data = sprinkler_dataset();
    let oracle = IndependenceOracle::new(&data);
    let names: Vec<&str> = data.names().collect();
    for &x in &names {
        for &y in &names {
            let xy = oracle.mutual_information(x, y).unwrap();
            let yx = oracle.mutual_information(y, x).unwrap();
            assert!(xy >= -1e-12, "I({x}; {y}) = {xy}");
            assert!((xy - yx).abs() < 1e-12);
        }
    }
}

#[test]
fn common_cause_screens_off_sprinkler_and_rain() {
    let data = sprinkler_dataset();
    let marginal = independence_test(&data, &["sprinkler", "rain"], &[], 0.05).unwrap();
    assert!(!marginal.independent);

    let conditional = independence_test(&data, &["sprinkler", "rain"], &["cloudy"], 0.05).unwrap();
    assert_eq!(conditional.degrees_of_freedom, 2);
    assert!(conditional.independent, "p = {}", conditional.p_value);

    let cmi =
        conditional_mutual_information(&data, "sprinkler", "rain", &["cloudy"]).unwrap();
    assert!((conditional.statistic - cmi).abs() < 1e-15);
}

#[test]
fn collider_creates_dependence_when_conditioned_on() {
    let data = sprinkler_dataset();
    let oracle = IndependenceOracle::new(&data);
    let given_cloudy = oracle
        .independence_test(&["sprinkler", "rain"], &["cloudy"])
        .unwrap();
    let given_cloudy_and_wet = oracle
        .independence_test(&["sprinkler", "rain"], &["cloudy", "wet"])
        .unwrap();
    assert!(given_cloudy.independent);
    assert!(!given_cloudy_and_wet.independent);
    assert_eq!(given_cloudy_and_wet.degrees_of_freedom, 4);
}

#[test]
fn independence_test_requires_two_dependent_variables() {
    let data = sprinkler_dataset();
    let err = independence_test(&data, &["cloudy", "rain", "wet"], &[], 0.05).unwrap_err();
    assert!(matches!(err, BayesNetError::Precondition(_)));
}

//! Shared fixtures for the bayesnet integration and property tests.

use bayesnet_core::{Dataset, Network, VariableSpec};

/// Rows of the sprinkler dataset per `(cloudy, sprinkler, rain)` combination:
/// `(row count, rows with wet grass)`. Booleans are encoded `true = 1`.
///
/// The table is a fixed 10 000-row draw from the classic sprinkler network
/// (`P(cloudy) = 0.5`, sprinkler and rain depend on cloudy, wet depends on
/// both).
pub const SPRINKLER_COUNTS: [((bool, bool, bool), (usize, usize)); 8] = [
    ((true, true, true), (395, 391)),
    ((true, true, false), (105, 95)),
    ((true, false, true), (3555, 3200)),
    ((true, false, false), (945, 0)),
    ((false, true, true), (522, 517)),
    ((false, true, false), (1978, 1780)),
    ((false, false, true), (523, 471)),
    ((false, false, false), (1977, 0)),
];

/// Column order of [`sprinkler_dataset`].
pub const SPRINKLER_COLUMNS: [&str; 4] = ["cloudy", "sprinkler", "rain", "wet"];

/// The 10 000-row sprinkler dataset with columns `cloudy, sprinkler, rain, wet`.
pub fn sprinkler_dataset() -> Dataset {
    let mut columns: [Vec<bool>; 4] = Default::default();
    for ((cloudy, sprinkler, rain), (count, wet_count)) in SPRINKLER_COUNTS {
        for row in 0..count {
            columns[0].push(cloudy);
            columns[1].push(sprinkler);
            columns[2].push(rain);
            columns[3].push(row < wet_count);
        }
    }

    let mut dataset = Dataset::new();
    for (name, values) in SPRINKLER_COLUMNS.into_iter().zip(columns) {
        dataset
            .insert_bool_column(name, &values)
            .expect("sprinkler columns are aligned");
    }
    dataset
}

/// `cloudy -> {sprinkler, rain}`, `{sprinkler, rain} -> wet`.
pub fn sprinkler_network() -> Network {
    Network::build([
        VariableSpec::root("cloudy"),
        VariableSpec::new("sprinkler", ["cloudy"]),
        VariableSpec::new("rain", ["cloudy"]),
        VariableSpec::new("wet", ["sprinkler", "rain"]),
    ])
    .expect("sprinkler network is a DAG")
}

/// `B; A <- B; C <- A; T; R <- [C, T]; S <- C; W <- [R, S]`.
pub fn lettered_network() -> Network {
    Network::build([
        VariableSpec::root("B"),
        VariableSpec::new("A", ["B"]),
        VariableSpec::new("C", ["A"]),
        VariableSpec::root("T"),
        VariableSpec::new("R", ["C", "T"]),
        VariableSpec::new("S", ["C"]),
        VariableSpec::new("W", ["R", "S"]),
    ])
    .expect("lettered network is a DAG")
}

/// Empirical `P(child = child_state | parent = parent_state)` in a dataset.
pub fn empirical_conditional(
    dataset: &Dataset,
    child: &str,
    child_state: u32,
    parent: &str,
    parent_state: u32,
) -> f64 {
    let child_values = dataset.column(child).expect("child column");
    let parent_values = dataset.column(parent).expect("parent column");
    let (mut matching, mut total) = (0usize, 0usize);
    for (&c, &p) in child_values.iter().zip(parent_values) {
        if p == parent_state {
            total += 1;
            if c == child_state {
                matching += 1;
            }
        }
    }
    matching as f64 / total as f64
}

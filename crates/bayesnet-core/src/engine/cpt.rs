//! Conditional probability tables and their empirical estimation.
//!
//! A [`Cpt`] maps a tuple of parent states to a distribution over the
//! variable's own observed states. Rows exist only for parent combinations
//! seen at least once in the fitting data: a missing row means "unobserved",
//! which is different from a row that assigns probability zero.

use std::collections::BTreeMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::engine::dataset::{Dataset, EncodedColumn, State};
use crate::engine::errors::BayesNetError;

/// Parent-state tuple used as a CPT row key. Empty for root variables.
pub type ParentStates = SmallVec<[State; 4]>;

/// Tolerance used when checking that a row is a probability distribution.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// A row-stochastic conditional probability table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cpt {
    variable: Arc<str>,
    parents: Vec<Arc<str>>,
    states: Vec<State>,
    #[cfg_attr(feature = "serde", serde(with = "crate::engine::serde_helpers::map_as_pairs"))]
    rows: BTreeMap<ParentStates, Vec<f64>>,
}

impl Cpt {
    /// Name of the variable this table describes.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Parent names, in the order used by row keys.
    pub fn parent_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parents.iter().map(|p| &**p)
    }

    /// The variable's own observed states, in enumeration order.
    ///
    /// `row[i]` is the probability of `states()[i]`.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Number of observed states.
    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    /// Returns true for a table without parents (single unconditional row).
    pub fn is_unconditional(&self) -> bool {
        self.parents.is_empty()
    }

    /// The distribution for a parent-state combination, or `None` when that
    /// combination was never observed.
    pub fn row(&self, parent_states: &[State]) -> Option<&[f64]> {
        self.rows.get(parent_states).map(Vec::as_slice)
    }

    /// All rows in ascending parent-state order.
    pub fn rows(&self) -> impl Iterator<Item = (&[State], &[f64])> + '_ {
        self.rows.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `P(variable = state | parents = parent_states)`.
    ///
    /// Fails with [`BayesNetError::UnobservedCombination`] when the parent
    /// combination has no row. A state never observed for this variable has
    /// probability zero.
    pub fn probability(&self, parent_states: &[State], state: State) -> Result<f64, BayesNetError> {
        let row = self
            .row(parent_states)
            .ok_or_else(|| self.unobserved(parent_states))?;
        Ok(self
            .states
            .binary_search(&state)
            .map(|idx| row[idx])
            .unwrap_or(0.0))
    }

    pub(crate) fn unobserved(&self, parent_states: &[State]) -> BayesNetError {
        BayesNetError::UnobservedCombination {
            variable: self.variable.to_string(),
            parent_states: parent_states.to_vec(),
        }
    }
}

/// Estimates the CPT of `target` given `parents` from empirical frequencies.
///
/// Rows are partitioned by the tuple of parent-column values; each row holds
/// the normalized frequency of every observed target state. Parent tuples with
/// no rows in the data produce no CPT row.
pub fn estimate_cpt<S: AsRef<str>>(
    target: &str,
    parents: &[S],
    dataset: &Dataset,
) -> Result<Cpt, BayesNetError> {
    let target_column = dataset
        .column(target)
        .map_err(|_| missing_column(target))?;
    let parent_columns = parents
        .iter()
        .map(|p| dataset.column(p.as_ref()).map_err(|_| missing_column(p.as_ref())))
        .collect::<Result<Vec<_>, _>>()?;

    let encoded = EncodedColumn::encode(target_column);
    let cardinality = encoded.cardinality();

    let mut counts: BTreeMap<ParentStates, Vec<u64>> = BTreeMap::new();
    for (row_idx, &code) in encoded.codes.iter().enumerate() {
        let key: ParentStates = parent_columns.iter().map(|col| col[row_idx]).collect();
        counts.entry(key).or_insert_with(|| vec![0; cardinality])[code as usize] += 1;
    }

    let rows = counts
        .into_iter()
        .map(|(key, row_counts)| {
            let total: u64 = row_counts.iter().sum();
            let row = row_counts
                .into_iter()
                .map(|c| c as f64 / total as f64)
                .collect();
            (key, row)
        })
        .collect();

    Ok(Cpt {
        variable: Arc::from(target),
        parents: parents.iter().map(|p| Arc::from(p.as_ref())).collect(),
        states: encoded.states,
        rows,
    })
}

fn missing_column(name: &str) -> BayesNetError {
    BayesNetError::Dataset(format!("no column for variable '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather() -> Dataset {
        Dataset::from_columns([
            ("cloudy", vec![1, 1, 1, 1, 0, 0, 0, 0]),
            ("rain", vec![1, 1, 1, 0, 0, 0, 0, 1]),
        ])
        .expect("dataset")
    }

    #[test]
    fn root_variable_has_single_unconditional_row() {
        let cpt = estimate_cpt::<&str>("cloudy", &[], &weather()).expect("cpt");
        assert!(cpt.is_unconditional());
        assert_eq!(cpt.row_count(), 1);
        assert_eq!(cpt.row(&[]).expect("row"), &[0.5, 0.5]);
    }

    #[test]
    fn conditional_rows_match_frequencies() {
        let cpt = estimate_cpt("rain", &["cloudy"], &weather()).expect("cpt");
        assert_eq!(cpt.states(), &[0, 1]);
        assert_eq!(cpt.row(&[1]).expect("cloudy row"), &[0.25, 0.75]);
        assert_eq!(cpt.row(&[0]).expect("clear row"), &[0.75, 0.25]);
        assert_eq!(cpt.probability(&[1], 1).expect("prob"), 0.75);
    }

    #[test]
    fn unobserved_parent_combination_has_no_row() {
        let ds = Dataset::from_columns([
            ("a", vec![0, 0, 1]),
            ("b", vec![0, 1, 0]),
            ("c", vec![1, 0, 1]),
        ])
        .expect("dataset");
        let cpt = estimate_cpt("c", &["a", "b"], &ds).expect("cpt");
        assert_eq!(cpt.row_count(), 3);
        assert!(cpt.row(&[1, 1]).is_none());
        assert!(matches!(
            cpt.probability(&[1, 1], 0),
            Err(BayesNetError::UnobservedCombination { .. })
        ));
    }

    #[test]
    fn observed_zero_probability_is_kept_in_row() {
        let cpt = estimate_cpt("rain", &["cloudy"], &weather()).expect("cpt");
        assert_eq!(cpt.probability(&[1], 42).expect("unseen state"), 0.0);

        let ds = Dataset::from_columns([("p", vec![0, 0, 1]), ("x", vec![0, 0, 1])])
            .expect("dataset");
        let cpt = estimate_cpt("x", &["p"], &ds).expect("cpt");
        assert_eq!(cpt.row(&[0]).expect("row"), &[1.0, 0.0]);
    }

    #[test]
    fn rows_are_stochastic() {
        let cpt = estimate_cpt("rain", &["cloudy"], &weather()).expect("cpt");
        for (_, row) in cpt.rows() {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < ROW_SUM_TOLERANCE);
        }
    }

    #[test]
    fn missing_column_is_dataset_error() {
        let err = estimate_cpt("wet", &["rain"], &weather()).expect_err("missing");
        assert!(matches!(err, BayesNetError::Dataset(_)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn fitted_cpt_round_trips_through_json() {
        let ds = Dataset::from_columns([
            ("a", vec![0, 0, 1, 1, 0, 1]),
            ("b", vec![0, 1, 0, 0, 1, 0]),
            ("c", vec![1, 0, 1, 2, 1, 1]),
        ])
        .expect("dataset");
        let cpt = estimate_cpt("c", &["a", "b"], &ds).expect("cpt");
        let json = serde_json::to_string(&cpt).expect("serialize");
        let back: Cpt = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.variable(), "c");
        assert_eq!(back.parent_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(back.states(), cpt.states());
        assert_eq!(back.row_count(), 3);
        for ((key, row), (back_key, back_row)) in cpt.rows().zip(back.rows()) {
            assert_eq!(key, back_key);
            for (p, q) in row.iter().zip(back_row) {
                assert!((p - q).abs() < 1e-12, "row {:?}: {} vs {}", key, p, q);
            }
        }
        assert!(back.row(&[1, 1]).is_none());
    }

    #[test]
    fn estimation_is_idempotent() {
        let ds = weather();
        let first = estimate_cpt("rain", &["cloudy"], &ds).expect("first");
        let second = estimate_cpt("rain", &["cloudy"], &ds).expect("second");
        assert_eq!(first, second);
    }
}

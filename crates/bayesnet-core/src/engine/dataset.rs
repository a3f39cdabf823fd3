//! In-memory observation datasets.
//!
//! A [`Dataset`] is a table of aligned columns, one per variable name. Row `i`
//! across all columns is one joint observation. Cells hold discrete-encoded
//! [`State`] codes; the meaning of a code (e.g. `0 = false`, `1 = true`) is the
//! caller's concern.
//!
//! Column order is the insertion order and is the canonical variable order used
//! by structure learning.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::engine::errors::BayesNetError;

/// A discrete-encoded cell value.
pub type State = u32;

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: Arc<str>,
    values: Vec<State>,
}

/// A column-oriented table of joint observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    index: FxHashMap<Arc<str>, usize>,
    rows: usize,
}

impl Dataset {
    /// Creates an empty dataset with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from `(name, values)` pairs, preserving their order.
    pub fn from_columns<N, I>(columns: I) -> Result<Self, BayesNetError>
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = (N, Vec<State>)>,
    {
        let mut dataset = Self::new();
        for (name, values) in columns {
            dataset.insert_column(name, values)?;
        }
        Ok(dataset)
    }

    /// Appends a column. All columns must have the same length and unique names.
    pub fn insert_column(
        &mut self,
        name: impl Into<Arc<str>>,
        values: Vec<State>,
    ) -> Result<(), BayesNetError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(BayesNetError::Dataset(format!(
                "duplicate column '{}'",
                name
            )));
        }
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(BayesNetError::Dataset(format!(
                "column '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.rows
            )));
        }
        self.rows = values.len();
        self.index.insert(name.clone(), self.columns.len());
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Appends a boolean column encoded as `false = 0`, `true = 1`.
    pub fn insert_bool_column(
        &mut self,
        name: impl Into<Arc<str>>,
        values: &[bool],
    ) -> Result<(), BayesNetError> {
        self.insert_column(name, values.iter().map(|&v| State::from(v)).collect())
    }

    /// Returns the values of a column.
    pub fn column(&self, name: &str) -> Result<&[State], BayesNetError> {
        self.index
            .get(name)
            .map(|&idx| self.columns[idx].values.as_slice())
            .ok_or_else(|| BayesNetError::UnknownVariable(name.to_string()))
    }

    /// Returns true if a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| &*c.name)
    }

    pub(crate) fn shared_names(&self) -> Vec<Arc<str>> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Number of rows (joint observations).
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Sorted distinct states observed in a column.
    pub fn states(&self, name: &str) -> Result<Vec<State>, BayesNetError> {
        let mut states = self.column(name)?.to_vec();
        states.sort_unstable();
        states.dedup();
        Ok(states)
    }

    /// Number of distinct states observed in a column.
    pub fn cardinality(&self, name: &str) -> Result<usize, BayesNetError> {
        self.states(name).map(|s| s.len())
    }
}

/// A column re-encoded to dense codes `0..cardinality`.
///
/// Codes follow the sorted order of the observed states, so `states[code]`
/// recovers the original value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedColumn {
    pub codes: Vec<u32>,
    pub states: Vec<State>,
}

impl EncodedColumn {
    pub fn encode(values: &[State]) -> Self {
        let mut states = values.to_vec();
        states.sort_unstable();
        states.dedup();
        let lookup: FxHashMap<State, u32> = states
            .iter()
            .enumerate()
            .map(|(code, &state)| (state, code as u32))
            .collect();
        let codes = values.iter().map(|v| lookup[v]).collect();
        Self { codes, states }
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }
}

//! Error types for network construction, fitting, sampling, and structure learning.

use thiserror::Error;

use crate::engine::dataset::State;

/// Errors that can occur while building, fitting, sampling, or learning a network.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// All public APIs return `Result<T, BayesNetError>` to avoid panics in library code.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BayesNetError {
    /// Parent references form a cycle. Holds the variable names along the cycle,
    /// starting and ending with the same name.
    #[error("cyclic graph: {}", .0.join(" -> "))]
    CyclicGraph(Vec<String>),

    /// A name was looked up (or referenced as a parent) that is not in the network.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// Two variables were declared with the same name.
    #[error("duplicate variable '{0}'")]
    DuplicateVariable(String),

    /// An operation was invoked with arguments that violate its contract
    /// (e.g., an independence test with other than two dependent variables).
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// A parent-state combination has no CPT row because it was never observed
    /// during fitting.
    #[error("unobserved parent combination {parent_states:?} for variable '{variable}'")]
    UnobservedCombination {
        variable: String,
        parent_states: Vec<State>,
    },

    /// A CPT was requested for a variable before `fit` attached one.
    #[error("variable '{0}' has no fitted CPT")]
    NotFitted(String),

    /// The observation dataset is malformed or missing a required column.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Invalid configuration or an unsupported request.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal invariant violation (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}

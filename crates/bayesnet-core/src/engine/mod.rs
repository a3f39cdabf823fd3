//! The computation engine for discrete Bayesian networks.
//!
//! This module provides:
//! - **errors**: Error type shared by every operation
//! - **dataset**: Column-oriented tables of discrete observations
//! - **network**: Variables, parent references, and the validated DAG
//! - **cpt**: Conditional probability tables and their empirical estimation
//! - **scheduler**: Ancestral (topological) ordering of a variable
//! - **sampler**: Seeded ancestral sampling of joint observations
//! - **numeric_kernels**: Chi-squared distribution functions
//! - **independence**: Mutual information and independence testing
//! - **skeleton**: Adjacency and separating sets during a skeleton search
//! - **structure**: PC structure learning
//! - **pdag**: Partially oriented graphs produced by structure learning
//! - **serde_helpers**: Sequence encoding for maps with structured keys

pub mod cpt;
pub mod dataset;
pub mod errors;
pub mod independence;
pub mod network;
pub mod numeric_kernels;
pub mod pdag;
pub mod sampler;
pub mod scheduler;
#[cfg(feature = "serde")]
pub(crate) mod serde_helpers;
pub mod skeleton;
pub mod structure;

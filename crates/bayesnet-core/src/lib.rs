//! # Bayesnet Core
//!
//! Discrete Bayesian networks: CPT estimation, ancestral sampling, and
//! constraint-based structure learning from observational data.

#![forbid(unsafe_code)]

pub mod engine;

// Re-export commonly used types
pub use engine::cpt::{estimate_cpt, Cpt};
pub use engine::dataset::{Dataset, State};
pub use engine::errors::BayesNetError;
pub use engine::independence::{
    conditional_mutual_information, independence_test, mutual_information, IndependenceConfig,
    IndependenceOracle, IndependenceTestResult, PValueMethod,
};
pub use engine::network::{Network, Variable, VariableId, VariableSpec};
pub use engine::pdag::{EdgeMark, PartiallyOrientedGraph, ResidualEdgePolicy};
pub use engine::sampler::{FallbackPolicy, JointSample, Sampler, SamplerConfig};
pub use engine::skeleton::SeparatingSets;
pub use engine::structure::{
    learn_structure, learn_structure_with_config, learn_structure_with_config_diagnostics,
    learn_structure_with_diagnostics, StructureLearningConfig, StructureLearningDiagnostics,
    StructureLearningResult,
};

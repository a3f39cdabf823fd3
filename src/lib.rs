//! # Bayesnet - Discrete Bayesian Networks
//!
//! Bayesnet builds discrete Bayesian networks from named variables, estimates
//! their conditional probability tables from observations, draws new joint
//! observations by ancestral sampling, and learns network structure from data
//! with the PC algorithm.
//!
//! ## Architecture
//!
//! The engine lives in `bayesnet-core`; this crate re-exports it:
//!
//! - **network / cpt**: Variables, DAG validation, and CPT estimation
//! - **scheduler / sampler**: Ancestral ordering and seeded sampling
//! - **independence**: Mutual information and chi-squared independence tests
//! - **structure / pdag**: PC skeleton search and collider orientation
//!
//! ## Usage
//!
//! ```rust
//! use bayesnet::{learn_structure, Dataset, Network, Sampler, VariableSpec};
//!
//! let data = Dataset::from_columns([
//!     ("cloudy", vec![1, 1, 0, 0, 1, 0, 1, 0]),
//!     ("rain", vec![1, 1, 0, 0, 1, 1, 0, 0]),
//! ])
//! .expect("aligned columns");
//!
//! let mut network = Network::build([
//!     VariableSpec::root("cloudy"),
//!     VariableSpec::new("rain", ["cloudy"]),
//! ])
//! .expect("valid DAG");
//! network.fit(&data).expect("every variable has a column");
//!
//! let samples = Sampler::new(&network)
//!     .generate_samples("rain", 100)
//!     .expect("fitted network");
//! assert_eq!(samples.len(), 100);
//!
//! let learned = learn_structure(&data).expect("structure");
//! assert_eq!(learned.graph.variables().count(), 2);
//! ```

#![forbid(unsafe_code)]

pub use bayesnet_core::*;

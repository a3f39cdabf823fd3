//! Ancestral sampling from a fitted network.
//!
//! Variables are visited in [`ancestral_order`](crate::engine::scheduler::ancestral_order);
//! roots draw from their unconditional row and every other variable draws from
//! the CPT row selected by its already-sampled parents.
//!
//! A parent combination that was never observed during fitting has no CPT row.
//! The default [`FallbackPolicy::Strict`] surfaces this as
//! [`BayesNetError::UnobservedCombination`]; [`FallbackPolicy::Uniform`] is an
//! explicit opt-in that draws uniformly over the variable's observed states.
//!
//! `generate_samples` consumes a single seeded random stream, so a fixed seed
//! always produces the same dataset. With the `parallel` feature,
//! `generate_samples_par` gives every draw its own stream derived from
//! `(seed, draw index)`: it is reproducible for a fixed seed regardless of
//! thread count, but it does not reproduce the sequential stream.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::engine::cpt::Cpt;
use crate::engine::dataset::{Dataset, State};
use crate::engine::errors::BayesNetError;
use crate::engine::network::{Network, VariableId};
use crate::engine::scheduler::ancestral_order;

/// What to do when a sampled parent combination has no CPT row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FallbackPolicy {
    /// Fail with [`BayesNetError::UnobservedCombination`].
    #[default]
    Strict,
    /// Draw uniformly over the variable's observed states.
    Uniform,
}

/// Configuration for ancestral sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerConfig {
    /// Seed of the random stream.
    pub seed: u64,
    /// Policy for unobserved parent combinations.
    pub fallback: FallbackPolicy,
}

/// One joint draw: a state for every variable in ancestral order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointSample {
    entries: Vec<(Arc<str>, State)>,
}

impl JointSample {
    /// State of the named variable, if it was part of this draw.
    pub fn get(&self, name: &str) -> Option<State> {
        self.entries
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, s)| *s)
    }

    /// `(name, state)` pairs in ancestral order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, State)> + '_ {
        self.entries.iter().map(|(n, s)| (&**n, *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Precomputed visit order with, for each step, the positions of its parents
/// among earlier steps.
#[derive(Debug)]
struct SamplingPlan<'n> {
    order: Vec<VariableId>,
    cpts: Vec<&'n Cpt>,
    parent_slots: Vec<SmallVec<[usize; 4]>>,
}

impl<'n> SamplingPlan<'n> {
    fn new(network: &'n Network, target: &str) -> Result<Self, BayesNetError> {
        let order = ancestral_order(network, network.id(target)?);
        let mut position = vec![usize::MAX; network.len()];
        for (slot, id) in order.iter().enumerate() {
            position[id.index()] = slot;
        }

        let mut cpts = Vec::with_capacity(order.len());
        let mut parent_slots = Vec::with_capacity(order.len());
        for &id in &order {
            let variable = network.variable(id);
            let cpt = variable
                .cpt()
                .ok_or_else(|| BayesNetError::NotFitted(variable.name().to_string()))?;
            cpts.push(cpt);
            parent_slots.push(
                variable
                    .parents()
                    .iter()
                    .map(|p| position[p.index()])
                    .collect(),
            );
        }
        Ok(Self {
            order,
            cpts,
            parent_slots,
        })
    }

    fn draw<R: Rng>(
        &self,
        rng: &mut R,
        fallback: FallbackPolicy,
    ) -> Result<Vec<State>, BayesNetError> {
        let mut states: Vec<State> = Vec::with_capacity(self.order.len());
        for (cpt, slots) in self.cpts.iter().zip(&self.parent_slots) {
            let parent_states: SmallVec<[State; 4]> = slots.iter().map(|&s| states[s]).collect();
            states.push(draw_from_cpt(cpt, &parent_states, rng, fallback)?);
        }
        Ok(states)
    }

    fn names(&self, network: &Network) -> Vec<Arc<str>> {
        self.order
            .iter()
            .map(|&id| Arc::from(network.variable(id).name()))
            .collect()
    }
}

/// Draws joint observations from a fitted [`Network`].
#[derive(Debug)]
pub struct Sampler<'n> {
    network: &'n Network,
    config: SamplerConfig,
    rng: StdRng,
}

impl<'n> Sampler<'n> {
    /// Creates a sampler with the default configuration (seed 0, strict).
    pub fn new(network: &'n Network) -> Self {
        Self::with_config(network, SamplerConfig::default())
    }

    pub fn with_config(network: &'n Network, config: SamplerConfig) -> Self {
        Self {
            network,
            config,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    pub fn config(&self) -> SamplerConfig {
        self.config
    }

    /// Draws one joint sample of `target` and all of its ancestors.
    pub fn sample_one(&mut self, target: &str) -> Result<JointSample, BayesNetError> {
        let plan = SamplingPlan::new(self.network, target)?;
        let states = plan.draw(&mut self.rng, self.config.fallback)?;
        Ok(JointSample {
            entries: plan.names(self.network).into_iter().zip(states).collect(),
        })
    }

    /// Draws `n` joint samples into a dataset with one column per variable in
    /// ancestral order.
    pub fn generate_samples(&mut self, target: &str, n: usize) -> Result<Dataset, BayesNetError> {
        let plan = SamplingPlan::new(self.network, target)?;
        let mut columns: Vec<Vec<State>> = vec![Vec::with_capacity(n); plan.order.len()];
        for _ in 0..n {
            let states = plan.draw(&mut self.rng, self.config.fallback)?;
            for (column, state) in columns.iter_mut().zip(states) {
                column.push(state);
            }
        }
        Dataset::from_columns(plan.names(self.network).into_iter().zip(columns))
    }

    /// Parallel variant of [`generate_samples`](Self::generate_samples) with
    /// one independently seeded stream per draw.
    ///
    /// Does not advance this sampler's own random stream.
    #[cfg(feature = "parallel")]
    pub fn generate_samples_par(&self, target: &str, n: usize) -> Result<Dataset, BayesNetError> {
        let plan = SamplingPlan::new(self.network, target)?;
        let seed = self.config.seed;
        let fallback = self.config.fallback;
        let rows: Vec<Vec<State>> = (0..n as u64)
            .into_par_iter()
            .map(|draw| {
                let mut rng = StdRng::seed_from_u64(stream_seed(seed, draw));
                plan.draw(&mut rng, fallback)
            })
            .collect::<Result<_, _>>()?;

        let mut columns: Vec<Vec<State>> = vec![Vec::with_capacity(n); plan.order.len()];
        for row in rows {
            for (column, state) in columns.iter_mut().zip(row) {
                column.push(state);
            }
        }
        Dataset::from_columns(plan.names(self.network).into_iter().zip(columns))
    }
}

/// SplitMix64 mix of the base seed and draw index.
#[cfg(feature = "parallel")]
fn stream_seed(seed: u64, draw: u64) -> u64 {
    let mut z = seed.wrapping_add(draw.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Index of the first state whose cumulative probability exceeds `u`.
///
/// `u` is expected in `[0, 1)`. If rounding leaves the total just below `u`,
/// the last state with positive probability is returned. Returns `None` for a
/// row without positive mass.
pub fn select_state(row: &[f64], u: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    for (idx, &p) in row.iter().enumerate() {
        cumulative += p;
        if cumulative > u {
            return Some(idx);
        }
    }
    row.iter().rposition(|&p| p > 0.0)
}

fn draw_from_cpt<R: Rng>(
    cpt: &Cpt,
    parent_states: &[State],
    rng: &mut R,
    fallback: FallbackPolicy,
) -> Result<State, BayesNetError> {
    match cpt.row(parent_states) {
        Some(row) => {
            let u: f64 = rng.gen();
            select_state(row, u)
                .map(|idx| cpt.states()[idx])
                .ok_or_else(|| {
                    BayesNetError::Internal(format!(
                        "CPT row for '{}' has no probability mass",
                        cpt.variable()
                    ))
                })
        }
        None => match fallback {
            FallbackPolicy::Strict => Err(cpt.unobserved(parent_states)),
            FallbackPolicy::Uniform => {
                if cpt.states().is_empty() {
                    return Err(cpt.unobserved(parent_states));
                }
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    variable = cpt.variable(),
                    ?parent_states,
                    "unobserved parent combination; drawing uniformly"
                );
                let idx = rng.gen_range(0..cpt.states().len());
                Ok(cpt.states()[idx])
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::network::VariableSpec;

    fn fitted(specs: Vec<VariableSpec>, data: Dataset) -> Network {
        let mut net = Network::build(specs).expect("network");
        net.fit(&data).expect("fit");
        net
    }

    #[test]
    fn select_state_uses_cumulative_order() {
        let row = [0.2, 0.5, 0.3];
        assert_eq!(select_state(&row, 0.0), Some(0));
        assert_eq!(select_state(&row, 0.19), Some(0));
        assert_eq!(select_state(&row, 0.2), Some(1));
        assert_eq!(select_state(&row, 0.69), Some(1));
        assert_eq!(select_state(&row, 0.7), Some(2));
    }

    #[test]
    fn select_state_skips_zero_probability_states() {
        assert_eq!(select_state(&[0.0, 1.0], 0.0), Some(1));
        assert_eq!(select_state(&[0.5, 0.5, 0.0], 0.999_999_999_9), Some(1));
        assert_eq!(select_state(&[0.0, 0.0], 0.3), None);
    }

    #[test]
    fn deterministic_child_follows_parent() {
        let data = Dataset::from_columns([("p", vec![0, 1, 0, 1]), ("c", vec![5, 7, 5, 7])])
            .expect("data");
        let net = fitted(vec![VariableSpec::root("p"), VariableSpec::new("c", ["p"])], data);
        let mut sampler = Sampler::new(&net);
        for _ in 0..50 {
            let sample = sampler.sample_one("c").expect("sample");
            let expected = if sample.get("p") == Some(0) { 5 } else { 7 };
            assert_eq!(sample.get("c"), Some(expected));
            assert_eq!(sample.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["p", "c"]);
        }
    }

    #[test]
    fn unfitted_network_cannot_sample() {
        let net = Network::build([VariableSpec::root("x")]).expect("network");
        let err = Sampler::new(&net).sample_one("x").expect_err("not fitted");
        assert_eq!(err, BayesNetError::NotFitted("x".into()));
    }

    fn gapped() -> Network {
        // (a=1, b=1) never occurs, so c has no row for it.
        let data = Dataset::from_columns([
            ("a", vec![0, 0, 1, 1, 0, 1]),
            ("b", vec![0, 1, 0, 0, 1, 0]),
            ("c", vec![0, 1, 1, 0, 1, 1]),
        ])
        .expect("data");
        let mut net = Network::build([
            VariableSpec::root("a"),
            VariableSpec::root("b"),
            VariableSpec::new("c", ["a", "b"]),
        ])
        .expect("network");
        net.fit(&data).expect("fit");
        net
    }

    #[test]
    fn strict_policy_reports_unobserved_combination() {
        let net = gapped();
        let mut sampler = Sampler::new(&net);
        let mut saw_error = false;
        for _ in 0..200 {
            match sampler.sample_one("c") {
                Ok(sample) => {
                    assert!(!(sample.get("a") == Some(1) && sample.get("b") == Some(1)));
                }
                Err(BayesNetError::UnobservedCombination {
                    variable,
                    parent_states,
                }) => {
                    assert_eq!(variable, "c");
                    assert_eq!(parent_states, vec![1, 1]);
                    saw_error = true;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert!(saw_error, "P(a=1, b=1) is 1/6 per draw; 200 draws must hit it");
    }

    #[test]
    fn uniform_policy_fills_unobserved_combination() {
        let net = gapped();
        let mut sampler = Sampler::with_config(
            &net,
            SamplerConfig {
                seed: 7,
                fallback: FallbackPolicy::Uniform,
            },
        );
        let data = sampler.generate_samples("c", 300).expect("samples");
        assert_eq!(data.len(), 300);
        assert_eq!(data.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn fixed_seed_reproduces_dataset() {
        let net = gapped();
        let config = SamplerConfig {
            seed: 99,
            fallback: FallbackPolicy::Uniform,
        };
        let first = Sampler::with_config(&net, config)
            .generate_samples("c", 64)
            .expect("first");
        let second = Sampler::with_config(&net, config)
            .generate_samples("c", 64)
            .expect("second");
        assert_eq!(first, second);
    }
}

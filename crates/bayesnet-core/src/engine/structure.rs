//! # Constraint-based structure learning
//!
//! Learns a partially oriented graph from a dataset with the PC algorithm:
//!
//! 1. Start from the complete undirected graph over the dataset columns.
//! 2. For conditioning-set sizes `n = 0, 1, 2, ...`, remove every edge `x - y`
//!    for which some subset `Z` of `adj(x) \ {y}` with `|Z| = n` makes `x` and
//!    `y` conditionally independent, and record `Z` as their separating set.
//!    Stop once no variable has more than `n` neighbours.
//! 3. Orient every unshielded triple `x - z - y` with `z` outside
//!    `sepset(x, y)` as a collider `x -> z <- y`.
//!
//! No further orientation rules are applied, so edges outside colliders stay
//! undirected.
//!
//! ## Order independence
//!
//! Conditioning sets at level `n` are drawn from the adjacency as it was when
//! the level started, not from the adjacency as edges disappear. Together with
//! the canonical (column-order) pair and subset enumeration this makes the
//! result independent of evaluation order, which is what allows the
//! `parallel` feature to test candidate pairs concurrently and still produce
//! exactly the sequential result.
//!
//! Collider conflicts (a later triple wanting to reverse an edge an earlier
//! triple oriented) keep the first orientation and are counted in
//! [`StructureLearningDiagnostics::orientation_conflicts`].

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::engine::dataset::Dataset;
use crate::engine::errors::BayesNetError;
use crate::engine::independence::{IndependenceConfig, IndependenceOracle};
use crate::engine::pdag::{OrientOutcome, PartiallyOrientedGraph};
use crate::engine::skeleton::{Combinations, ConditioningSet, SeparatingSets, SkeletonState};

/// Configuration for [`learn_structure_with_config`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureLearningConfig {
    pub independence: IndependenceConfig,
    /// Largest conditioning-set size to try. `None` runs until the natural
    /// termination condition.
    pub max_conditioning_size: Option<usize>,
}

impl StructureLearningConfig {
    fn validate(self) -> Result<Self, BayesNetError> {
        self.independence.validate()?;
        Ok(self)
    }
}

/// Counters describing one structure-learning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StructureLearningDiagnostics {
    /// Independence tests evaluated.
    pub tests_run: usize,
    /// Edges removed from the complete graph.
    pub edges_removed: usize,
    /// Pruning levels (conditioning-set sizes) fully processed.
    pub levels_completed: usize,
    /// Largest conditioning-set size used by any test.
    pub max_conditioning_size_reached: usize,
    /// Unshielded triples oriented as colliders.
    pub colliders_oriented: usize,
    /// Collider orientations rejected because the edge already pointed the
    /// other way.
    pub orientation_conflicts: usize,
}

/// Output of structure learning.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureLearningResult {
    pub graph: PartiallyOrientedGraph,
    pub separating_sets: SeparatingSets,
}

/// Learns structure with default configuration.
pub fn learn_structure(dataset: &Dataset) -> Result<StructureLearningResult, BayesNetError> {
    learn_structure_with_config(dataset, StructureLearningConfig::default())
}

/// Learns structure with explicit configuration.
pub fn learn_structure_with_config(
    dataset: &Dataset,
    config: StructureLearningConfig,
) -> Result<StructureLearningResult, BayesNetError> {
    learn_structure_with_config_diagnostics(dataset, config).map(|(result, _)| result)
}

/// Learns structure with default configuration and diagnostics.
pub fn learn_structure_with_diagnostics(
    dataset: &Dataset,
) -> Result<(StructureLearningResult, StructureLearningDiagnostics), BayesNetError> {
    learn_structure_with_config_diagnostics(dataset, StructureLearningConfig::default())
}

/// Learns structure with explicit configuration and diagnostics.
pub fn learn_structure_with_config_diagnostics(
    dataset: &Dataset,
    config: StructureLearningConfig,
) -> Result<(StructureLearningResult, StructureLearningDiagnostics), BayesNetError> {
    let config = config.validate()?;
    let oracle = IndependenceOracle::with_config(dataset, config.independence)?;
    let names = oracle.names().to_vec();

    let mut diagnostics = StructureLearningDiagnostics::default();
    let mut skeleton = SkeletonState::complete(names.len());
    let mut separating_sets = SeparatingSets::new(names.clone());

    let mut level = 0;
    while skeleton.max_degree() > level
        && config
            .max_conditioning_size
            .map_or(true, |limit| level <= limit)
    {
        prune_level(
            &oracle,
            &mut skeleton,
            &mut separating_sets,
            level,
            &mut diagnostics,
        );
        diagnostics.levels_completed += 1;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            level,
            remaining_edges = skeleton.edges().count(),
            tests_run = diagnostics.tests_run,
            "structure learning: pruning level complete"
        );
        level += 1;
    }

    let mut graph = PartiallyOrientedGraph::from_skeleton(names, &skeleton);
    orient_colliders(&skeleton, &separating_sets, &mut graph, &mut diagnostics);

    #[cfg(feature = "tracing")]
    tracing::info!(
        variables = skeleton.len(),
        edges = graph.edge_count(),
        colliders = diagnostics.colliders_oriented,
        levels = diagnostics.levels_completed,
        "structure learning finished"
    );

    Ok((
        StructureLearningResult {
            graph,
            separating_sets,
        },
        diagnostics,
    ))
}

/// Result of searching for a separating set for one ordered pair.
#[derive(Debug)]
struct PairOutcome {
    x: usize,
    y: usize,
    tests: usize,
    separated_by: Option<ConditioningSet>,
}

fn evaluate_pair(
    oracle: &IndependenceOracle,
    frozen: &[Vec<usize>],
    x: usize,
    y: usize,
    level: usize,
) -> PairOutcome {
    let candidates: Vec<usize> = frozen[x].iter().copied().filter(|&v| v != y).collect();
    let mut outcome = PairOutcome {
        x,
        y,
        tests: 0,
        separated_by: None,
    };
    for subset in Combinations::new(&candidates, level) {
        outcome.tests += 1;
        if oracle.test_indices(x, y, &subset).independent {
            outcome.separated_by = Some(subset);
            break;
        }
    }
    outcome
}

/// Ordered pairs eligible at `level`, in canonical order.
fn candidate_pairs(frozen: &[Vec<usize>], level: usize) -> Vec<(usize, usize)> {
    frozen
        .iter()
        .enumerate()
        .filter(|(_, adj)| adj.len() > level)
        .flat_map(|(x, adj)| adj.iter().map(move |&y| (x, y)))
        .collect()
}

fn prune_level(
    oracle: &IndependenceOracle,
    skeleton: &mut SkeletonState,
    separating_sets: &mut SeparatingSets,
    level: usize,
    diagnostics: &mut StructureLearningDiagnostics,
) {
    let frozen = skeleton.freeze();
    let pairs = candidate_pairs(&frozen, level);

    // Evaluate everything up front, then apply in canonical order; a pair whose
    // edge was already removed from the other side is discarded unseen.
    #[cfg(feature = "parallel")]
    let outcomes: Vec<PairOutcome> = pairs
        .par_iter()
        .map(|&(x, y)| evaluate_pair(oracle, &frozen, x, y, level))
        .collect();

    #[cfg(feature = "parallel")]
    for outcome in outcomes {
        apply_outcome(outcome, skeleton, separating_sets, level, diagnostics);
    }

    #[cfg(not(feature = "parallel"))]
    for (x, y) in pairs {
        if !skeleton.is_adjacent(x, y) {
            continue;
        }
        let outcome = evaluate_pair(oracle, &frozen, x, y, level);
        apply_outcome(outcome, skeleton, separating_sets, level, diagnostics);
    }
}

fn apply_outcome(
    outcome: PairOutcome,
    skeleton: &mut SkeletonState,
    separating_sets: &mut SeparatingSets,
    level: usize,
    diagnostics: &mut StructureLearningDiagnostics,
) {
    let PairOutcome {
        x,
        y,
        tests,
        separated_by,
    } = outcome;
    if !skeleton.is_adjacent(x, y) {
        return;
    }
    diagnostics.tests_run += tests;
    if tests > 0 {
        diagnostics.max_conditioning_size_reached =
            diagnostics.max_conditioning_size_reached.max(level);
    }
    let Some(set) = separated_by else {
        return;
    };

    skeleton.remove(x, y);
    diagnostics.edges_removed += 1;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        x,
        y,
        conditioning = ?set.as_slice(),
        "structure learning: edge removed"
    );
    separating_sets.insert(x, y, set);
}

fn orient_colliders(
    skeleton: &SkeletonState,
    separating_sets: &SeparatingSets,
    graph: &mut PartiallyOrientedGraph,
    diagnostics: &mut StructureLearningDiagnostics,
) {
    for z in 0..skeleton.len() {
        let neighbors: Vec<usize> = skeleton.neighbors(z).iter().copied().collect();
        for (i, &x) in neighbors.iter().enumerate() {
            for &y in &neighbors[i + 1..] {
                if skeleton.is_adjacent(x, y) {
                    continue;
                }
                let in_sepset = separating_sets
                    .get_indices(x, y)
                    .is_some_and(|set| set.contains(&z));
                if in_sepset {
                    continue;
                }

                diagnostics.colliders_oriented += 1;
                for from in [x, y] {
                    if graph.orient(from, z) == OrientOutcome::Conflict {
                        diagnostics.orientation_conflicts += 1;
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            from,
                            to = z,
                            "structure learning: conflicting collider orientation ignored"
                        );
                    }
                }
            }
        }
    }
}

//! Partially oriented graphs produced by structure learning.
//!
//! Every adjacent pair carries one mark: undirected, or directed one way.
//! Only unshielded colliders are oriented by the learner; remaining edges stay
//! undirected because no orientation propagation is applied.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::engine::errors::BayesNetError;
use crate::engine::network::{Network, VariableSpec};
use crate::engine::skeleton::SkeletonState;

/// Orientation of a canonical pair `(a, b)` with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Orientation {
    Undirected,
    /// `a -> b`
    Forward,
    /// `b -> a`
    Backward,
}

/// The mark of one edge, with its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMark<'g> {
    /// `a - b`, endpoints in registration order.
    Undirected(&'g str, &'g str),
    Directed { from: &'g str, to: &'g str },
}

/// What happened when an orientation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrientOutcome {
    Applied,
    AlreadyOriented,
    /// The edge was already oriented the other way; the earlier mark is kept.
    Conflict,
    NotAdjacent,
}

/// How [`PartiallyOrientedGraph::to_network`] treats undirected edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResidualEdgePolicy {
    /// Fail with [`BayesNetError::Validation`] if any edge is undirected.
    #[default]
    Reject,
    /// Orient undirected edges from the earlier to the later registered variable.
    RegistrationOrder,
}

/// Adjacency with per-edge orientation marks over named variables.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartiallyOrientedGraph {
    names: Vec<Arc<str>>,
    index: FxHashMap<Arc<str>, usize>,
    #[cfg_attr(feature = "serde", serde(with = "crate::engine::serde_helpers::map_as_pairs"))]
    edges: BTreeMap<(usize, usize), Orientation>,
}

impl PartiallyOrientedGraph {
    pub(crate) fn from_skeleton(names: Vec<Arc<str>>, skeleton: &SkeletonState) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        let edges = skeleton
            .edges()
            .map(|pair| (pair, Orientation::Undirected))
            .collect();
        Self {
            names,
            index,
            edges,
        }
    }

    /// Marks `from -> to`.
    pub(crate) fn orient(&mut self, from: usize, to: usize) -> OrientOutcome {
        let (key, wanted) = if from < to {
            ((from, to), Orientation::Forward)
        } else {
            ((to, from), Orientation::Backward)
        };
        let Some(mark) = self.edges.get_mut(&key) else {
            return OrientOutcome::NotAdjacent;
        };
        match *mark {
            Orientation::Undirected => {
                *mark = wanted;
                OrientOutcome::Applied
            }
            current if current == wanted => OrientOutcome::AlreadyOriented,
            _ => OrientOutcome::Conflict,
        }
    }

    fn resolve(&self, name: &str) -> Result<usize, BayesNetError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| BayesNetError::UnknownVariable(name.to_string()))
    }

    fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    fn edge_mark(&self, (a, b): (usize, usize), orientation: Orientation) -> EdgeMark<'_> {
        match orientation {
            Orientation::Undirected => EdgeMark::Undirected(self.name(a), self.name(b)),
            Orientation::Forward => EdgeMark::Directed {
                from: self.name(a),
                to: self.name(b),
            },
            Orientation::Backward => EdgeMark::Directed {
                from: self.name(b),
                to: self.name(a),
            },
        }
    }

    /// Variable names in registration (dataset column) order.
    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(|n| &**n)
    }

    /// All edges in canonical order (by registration index of both endpoints).
    pub fn edges(&self) -> impl Iterator<Item = EdgeMark<'_>> + '_ {
        self.edges.iter().map(|(&pair, &o)| self.edge_mark(pair, o))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The mark between `a` and `b`, or `None` if they are not adjacent.
    pub fn mark(&self, a: &str, b: &str) -> Result<Option<EdgeMark<'_>>, BayesNetError> {
        let (a, b) = (self.resolve(a)?, self.resolve(b)?);
        let key = (a.min(b), a.max(b));
        Ok(self.edges.get(&key).map(|&o| self.edge_mark(key, o)))
    }

    pub fn is_adjacent(&self, a: &str, b: &str) -> Result<bool, BayesNetError> {
        Ok(self.mark(a, b)?.is_some())
    }

    /// True iff the edge is oriented `from -> to`.
    pub fn is_directed(&self, from: &str, to: &str) -> Result<bool, BayesNetError> {
        Ok(matches!(
            self.mark(from, to)?,
            Some(EdgeMark::Directed { from: f, .. }) if f == from
        ))
    }

    fn incident(&self, name: &str) -> Result<Vec<(usize, Orientation, bool)>, BayesNetError> {
        let x = self.resolve(name)?;
        Ok(self
            .edges
            .iter()
            .filter_map(|(&(a, b), &o)| {
                if a == x {
                    Some((b, o, true))
                } else if b == x {
                    Some((a, o, false))
                } else {
                    None
                }
            })
            .collect())
    }

    /// Every variable adjacent to `name`, regardless of mark.
    pub fn neighbors(&self, name: &str) -> Result<Vec<&str>, BayesNetError> {
        Ok(self
            .incident(name)?
            .into_iter()
            .map(|(other, _, _)| self.name(other))
            .collect())
    }

    /// Variables with an edge directed into `name`.
    pub fn parents_of(&self, name: &str) -> Result<Vec<&str>, BayesNetError> {
        Ok(self
            .incident(name)?
            .into_iter()
            .filter(|&(_, o, is_low)| {
                matches!(
                    (o, is_low),
                    (Orientation::Backward, true) | (Orientation::Forward, false)
                )
            })
            .map(|(other, _, _)| self.name(other))
            .collect())
    }

    /// Variables with an edge directed out of `name`.
    pub fn children_of(&self, name: &str) -> Result<Vec<&str>, BayesNetError> {
        Ok(self
            .incident(name)?
            .into_iter()
            .filter(|&(_, o, is_low)| {
                matches!(
                    (o, is_low),
                    (Orientation::Forward, true) | (Orientation::Backward, false)
                )
            })
            .map(|(other, _, _)| self.name(other))
            .collect())
    }

    /// Directed edges as `(from, to)`.
    pub fn directed_edges(&self) -> Vec<(&str, &str)> {
        self.edges()
            .filter_map(|e| match e {
                EdgeMark::Directed { from, to } => Some((from, to)),
                EdgeMark::Undirected(..) => None,
            })
            .collect()
    }

    /// Undirected edges with endpoints in registration order.
    pub fn undirected_edges(&self) -> Vec<(&str, &str)> {
        self.edges()
            .filter_map(|e| match e {
                EdgeMark::Undirected(a, b) => Some((a, b)),
                EdgeMark::Directed { .. } => None,
            })
            .collect()
    }

    /// The adjacency with marks dropped, endpoints in registration order.
    pub fn skeleton(&self) -> Vec<(&str, &str)> {
        self.edges
            .keys()
            .map(|&(a, b)| (self.name(a), self.name(b)))
            .collect()
    }

    /// True iff no undirected edge remains.
    pub fn is_fully_oriented(&self) -> bool {
        self.edges.values().all(|&o| o != Orientation::Undirected)
    }

    /// Seeds a [`Network`] from this graph. Directed edges become parent
    /// references; undirected edges are handled by `policy`. Parents are listed
    /// in registration order and the result is validated like any network.
    pub fn to_network(&self, policy: ResidualEdgePolicy) -> Result<Network, BayesNetError> {
        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); self.names.len()];
        for (&(a, b), &o) in &self.edges {
            match (o, policy) {
                (Orientation::Forward, _)
                | (Orientation::Undirected, ResidualEdgePolicy::RegistrationOrder) => {
                    parents[b].push(a)
                }
                (Orientation::Backward, _) => parents[a].push(b),
                (Orientation::Undirected, ResidualEdgePolicy::Reject) => {
                    return Err(BayesNetError::Validation(format!(
                        "edge {} - {} is not oriented",
                        self.name(a),
                        self.name(b)
                    )));
                }
            }
        }

        Network::build(self.names.iter().zip(parents).map(|(name, mut ps)| {
            ps.sort_unstable();
            VariableSpec::new(name.clone(), ps.into_iter().map(|p| self.names[p].clone()))
        }))
    }
}

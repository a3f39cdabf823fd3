//! Ancestral scheduling.
//!
//! Computes the order in which a target variable and its transitive parents
//! must be visited so that every variable comes after all of its parents.
//!
//! The order is produced by a breadth-first walk from the target along parent
//! references (in each variable's declared parent order), recording first
//! discovery, then reversed. For the network
//! `B; A<-B; C<-A; T; R<-[C,T]; S<-C; W<-[R,S]` this yields
//! `[B, A, T, C, S, R, W]` for `W`.
//!
//! A reversed BFS discovery order can place a variable before one of its own
//! parents when that parent is discovered later at the same depth (e.g.
//! `W<-[A,R]; R<-A`). Such orders are repaired with a stable topological pass
//! that keeps the reversed discovery rank as priority, so valid orders are
//! returned unchanged.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::engine::errors::BayesNetError;
use crate::engine::network::{Network, Variable, VariableId};

impl Network {
    /// Ancestral order of `target`: each ancestor exactly once, parents before
    /// children, ending with `target`.
    pub fn topological_order(&self, target: &str) -> Result<Vec<&Variable>, BayesNetError> {
        let id = self.id(target)?;
        Ok(ancestral_order(self, id)
            .into_iter()
            .map(|v| self.variable(v))
            .collect())
    }

    /// Names in the ancestral order of `target`.
    pub fn topological_names(&self, target: &str) -> Result<Vec<&str>, BayesNetError> {
        Ok(self
            .topological_order(target)?
            .into_iter()
            .map(Variable::name)
            .collect())
    }
}

/// Ancestral order of `target` as ids.
///
/// Uses an explicit worklist and set membership; acyclicity is guaranteed by
/// [`Network::build`], so no cycle detection happens here.
pub fn ancestral_order(network: &Network, target: VariableId) -> Vec<VariableId> {
    let mut included: FxHashSet<VariableId> = FxHashSet::default();
    let mut discovered = vec![target];
    let mut queue = VecDeque::from([target]);
    included.insert(target);

    while let Some(current) = queue.pop_front() {
        for &parent in network.variable(current).parents() {
            if included.insert(parent) {
                discovered.push(parent);
                queue.push_back(parent);
            }
        }
    }

    discovered.reverse();
    if respects_parents(network, &discovered) {
        return discovered;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target_variable = network.variable(target).name(),
        "reversed discovery order violates a parent constraint; repairing"
    );
    stable_topological_repair(network, &discovered)
}

fn respects_parents(network: &Network, order: &[VariableId]) -> bool {
    let mut placed: FxHashSet<VariableId> = FxHashSet::default();
    for &id in order {
        if !network
            .variable(id)
            .parents()
            .iter()
            .all(|p| placed.contains(p))
        {
            return false;
        }
        placed.insert(id);
    }
    true
}

/// Kahn's algorithm over the ancestor set, always emitting the ready variable
/// with the lowest rank in `order`.
fn stable_topological_repair(network: &Network, order: &[VariableId]) -> Vec<VariableId> {
    let rank: FxHashMap<VariableId, usize> =
        order.iter().enumerate().map(|(r, &id)| (id, r)).collect();
    let mut pending: Vec<usize> = order
        .iter()
        .map(|&id| network.variable(id).parents().len())
        .collect();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); order.len()];
    for (child_rank, &id) in order.iter().enumerate() {
        for parent in network.variable(id).parents() {
            children[rank[parent]].push(child_rank);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(r, _)| Reverse(r))
        .collect();

    let mut repaired = Vec::with_capacity(order.len());
    while let Some(Reverse(r)) = ready.pop() {
        repaired.push(order[r]);
        for &child in &children[r] {
            pending[child] -= 1;
            if pending[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }
    repaired
}

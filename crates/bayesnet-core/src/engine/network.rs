//! # Discrete Bayesian Network
//!
//! This module implements the variable/network model.
//!
//! ## Key Components
//!
//! - **VariableSpec**: a declaration (name plus parent names) used to build a network
//! - **Variable**: a discrete random variable with index-based parent references,
//!   its observed cardinality, and its CPT once fitted
//! - **Network**: an arena of variables with a validated DAG invariant
//!
//! ## Design
//!
//! Variables live in a stable-id arena (`VariableId` indexes into a `Vec`).
//! A variable references its parents by id and never its children; the
//! inverted children index is derived on first use and cached.
//!
//! ## Example
//!
//! ```rust
//! use bayesnet_core::engine::network::{Network, VariableSpec};
//!
//! let network = Network::build([
//!     VariableSpec::root("cloudy"),
//!     VariableSpec::new("rain", ["cloudy"]),
//! ])
//! .expect("valid DAG");
//! assert!(network.is_root("cloudy").unwrap());
//! ```

use std::sync::{Arc, OnceLock};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::engine::cpt::{estimate_cpt, Cpt};
use crate::engine::dataset::Dataset;
use crate::engine::errors::BayesNetError;

/// A unique identifier for a variable in a network.
///
/// Ids are dense, assigned in declaration order, and index the network arena.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableId(pub u32);

impl VariableId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

type IdList = SmallVec<[VariableId; 4]>;

/// Declaration of a variable and its parents, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    name: Arc<str>,
    parents: Vec<Arc<str>>,
}

impl VariableSpec {
    /// Declares a variable with the given parents, in traversal order.
    pub fn new<N, I, P>(name: N, parents: I) -> Self
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = P>,
        P: Into<Arc<str>>,
    {
        Self {
            name: name.into(),
            parents: parents.into_iter().map(Into::into).collect(),
        }
    }

    /// Declares a variable without parents.
    pub fn root(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> impl Iterator<Item = &str> + '_ {
        self.parents.iter().map(|p| &**p)
    }
}

/// A discrete random variable inside a [`Network`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    id: VariableId,
    name: Arc<str>,
    parents: IdList,
    cardinality: Option<usize>,
    cpt: Option<Cpt>,
}

impl Variable {
    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent ids in declaration order.
    pub fn parents(&self) -> &[VariableId] {
        &self.parents
    }

    /// True iff the variable has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Number of distinct observed states; `None` before fitting.
    pub fn cardinality(&self) -> Option<usize> {
        self.cardinality
    }

    /// The fitted CPT; `None` before fitting.
    pub fn cpt(&self) -> Option<&Cpt> {
        self.cpt.as_ref()
    }
}

/// A validated DAG of discrete variables.
#[derive(Debug, Clone)]
pub struct Network {
    variables: Vec<Variable>,
    by_name: FxHashMap<Arc<str>, VariableId>,
    children: OnceLock<Vec<IdList>>,
}

impl Network {
    /// Builds a network from variable declarations.
    ///
    /// Fails with [`BayesNetError::DuplicateVariable`] on repeated names,
    /// [`BayesNetError::UnknownVariable`] for parents that are not declared, and
    /// [`BayesNetError::CyclicGraph`] if parent references form a cycle.
    pub fn build(specs: impl IntoIterator<Item = VariableSpec>) -> Result<Self, BayesNetError> {
        let specs: Vec<VariableSpec> = specs.into_iter().collect();

        let mut by_name = FxHashMap::default();
        for (idx, spec) in specs.iter().enumerate() {
            if by_name
                .insert(spec.name.clone(), VariableId(idx as u32))
                .is_some()
            {
                return Err(BayesNetError::DuplicateVariable(spec.name.to_string()));
            }
        }

        let mut variables = Vec::with_capacity(specs.len());
        for (idx, spec) in specs.into_iter().enumerate() {
            let mut parents = IdList::new();
            let mut seen = FxHashSet::default();
            for parent in &spec.parents {
                let parent_id = *by_name
                    .get(parent)
                    .ok_or_else(|| BayesNetError::UnknownVariable(parent.to_string()))?;
                if !seen.insert(parent_id) {
                    return Err(BayesNetError::Validation(format!(
                        "variable '{}' lists parent '{}' more than once",
                        spec.name, parent
                    )));
                }
                parents.push(parent_id);
            }
            variables.push(Variable {
                id: VariableId(idx as u32),
                name: spec.name,
                parents,
                cardinality: None,
                cpt: None,
            });
        }

        let network = Self {
            variables,
            by_name,
            children: OnceLock::new(),
        };
        network.check_acyclic()?;
        Ok(network)
    }

    /// Iterative DFS over parent references; reaching a variable that is still
    /// on the current DFS path means a cycle.
    fn check_acyclic(&self) -> Result<(), BayesNetError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnPath,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.variables.len()];
        let mut path: Vec<(VariableId, usize)> = Vec::new();

        for start in &self.variables {
            if marks[start.id.index()] != Mark::Unvisited {
                continue;
            }
            marks[start.id.index()] = Mark::OnPath;
            path.push((start.id, 0));

            while let Some(top) = path.last_mut() {
                let (current, next) = *top;
                let parents = &self.variables[current.index()].parents;
                if next == parents.len() {
                    marks[current.index()] = Mark::Done;
                    path.pop();
                    continue;
                }
                top.1 += 1;
                let parent = parents[next];
                match marks[parent.index()] {
                    Mark::Unvisited => {
                        marks[parent.index()] = Mark::OnPath;
                        path.push((parent, 0));
                    }
                    Mark::OnPath => {
                        let start_at = path
                            .iter()
                            .position(|(id, _)| *id == parent)
                            .unwrap_or(0);
                        let mut cycle: Vec<String> = path[start_at..]
                            .iter()
                            .map(|(id, _)| self.variables[id.index()].name.to_string())
                            .collect();
                        cycle.push(self.variables[parent.index()].name.to_string());
                        return Err(BayesNetError::CyclicGraph(cycle));
                    }
                    Mark::Done => {}
                }
            }
        }
        Ok(())
    }

    /// Looks up a variable by name.
    pub fn lookup(&self, name: &str) -> Result<&Variable, BayesNetError> {
        self.id(name).map(|id| &self.variables[id.index()])
    }

    /// Resolves a name to its id.
    pub fn id(&self, name: &str) -> Result<VariableId, BayesNetError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| BayesNetError::UnknownVariable(name.to_string()))
    }

    /// Returns the variable for an id, if it belongs to this network.
    pub fn get(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub(crate) fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    /// All variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.variables.iter().map(|v| v.id)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables.iter().map(|v| v.name())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// True iff the named variable has no parents.
    pub fn is_root(&self, name: &str) -> Result<bool, BayesNetError> {
        self.lookup(name).map(Variable::is_root)
    }

    /// Parents of the named variable, in declaration order.
    pub fn parents_of(&self, name: &str) -> Result<Vec<&Variable>, BayesNetError> {
        let variable = self.lookup(name)?;
        Ok(variable
            .parents
            .iter()
            .map(|&p| self.variable(p))
            .collect())
    }

    /// Children of the named variable, in declaration order.
    ///
    /// The inverted index is built once on first call.
    pub fn children_of(&self, name: &str) -> Result<Vec<&Variable>, BayesNetError> {
        let id = self.id(name)?;
        Ok(self.children_index()[id.index()]
            .iter()
            .map(|&c| self.variable(c))
            .collect())
    }

    /// Every variable with the names of its children, in declaration order.
    ///
    /// This is the adjacency a renderer needs to draw the network.
    pub fn children_map(&self) -> Vec<(&str, Vec<&str>)> {
        let index = self.children_index();
        self.variables
            .iter()
            .map(|v| {
                let children = index[v.id.index()]
                    .iter()
                    .map(|&c| self.variable(c).name())
                    .collect();
                (v.name(), children)
            })
            .collect()
    }

    fn children_index(&self) -> &[IdList] {
        self.children.get_or_init(|| {
            let mut index = vec![IdList::new(); self.variables.len()];
            for child in &self.variables {
                for &parent in &child.parents {
                    index[parent.index()].push(child.id);
                }
            }
            index
        })
    }

    /// Estimates and attaches a CPT (and cardinality) for every variable.
    ///
    /// Either every variable is fitted or, on error, none is modified.
    /// Re-fitting with the same dataset reproduces the same tables.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<(), BayesNetError> {
        #[cfg(feature = "parallel")]
        let cpts: Vec<Cpt> = self
            .variables
            .par_iter()
            .map(|v| self.estimate_for(v, dataset))
            .collect::<Result<_, _>>()?;
        #[cfg(not(feature = "parallel"))]
        let cpts: Vec<Cpt> = self
            .variables
            .iter()
            .map(|v| self.estimate_for(v, dataset))
            .collect::<Result<_, _>>()?;

        for (variable, cpt) in self.variables.iter_mut().zip(cpts) {
            variable.cardinality = Some(cpt.cardinality());
            variable.cpt = Some(cpt);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            variables = self.variables.len(),
            rows = dataset.len(),
            "fitted conditional probability tables"
        );
        Ok(())
    }

    /// Estimates the CPT for one variable without attaching it.
    pub fn estimate_cpt(&self, name: &str, dataset: &Dataset) -> Result<Cpt, BayesNetError> {
        self.estimate_for(self.lookup(name)?, dataset)
    }

    fn estimate_for(&self, variable: &Variable, dataset: &Dataset) -> Result<Cpt, BayesNetError> {
        let parents: SmallVec<[&str; 4]> = variable
            .parents
            .iter()
            .map(|&p| self.variable(p).name())
            .collect();
        estimate_cpt(variable.name(), &parents, dataset)
    }

    /// The fitted CPT of the named variable.
    pub fn cpt(&self, name: &str) -> Result<&Cpt, BayesNetError> {
        self.lookup(name)?
            .cpt()
            .ok_or_else(|| BayesNetError::NotFitted(name.to_string()))
    }
}

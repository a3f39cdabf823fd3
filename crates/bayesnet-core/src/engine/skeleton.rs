//! Transient state of a skeleton search: undirected adjacency plus the
//! separating sets that justified each removed edge.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub(crate) type ConditioningSet = SmallVec<[usize; 4]>;

/// Normalizes an unordered pair to `(min, max)`.
#[inline]
fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Undirected adjacency over variable indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SkeletonState {
    adjacency: Vec<BTreeSet<usize>>,
}

impl SkeletonState {
    /// The complete undirected graph on `n` variables.
    pub fn complete(n: usize) -> Self {
        let adjacency = (0..n)
            .map(|x| (0..n).filter(|&y| y != x).collect())
            .collect();
        Self { adjacency }
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].contains(&b)
    }

    pub fn neighbors(&self, a: usize) -> &BTreeSet<usize> {
        &self.adjacency[a]
    }

    /// Removes the edge `a - b`; returns false if it was already absent.
    pub fn remove(&mut self, a: usize, b: usize) -> bool {
        let removed = self.adjacency[a].remove(&b);
        self.adjacency[b].remove(&a);
        removed
    }

    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).max().unwrap_or(0)
    }

    /// Adjacency snapshot used to draw conditioning sets for one level.
    pub fn freeze(&self) -> Vec<Vec<usize>> {
        self.adjacency
            .iter()
            .map(|adj| adj.iter().copied().collect())
            .collect()
    }

    /// Edges as `(a, b)` with `a < b`, in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(a, adj)| adj.range(a + 1..).map(move |&b| (a, b)))
    }
}

/// Separating sets recorded for removed edges, keyed by unordered pair.
///
/// A pair found independent without conditioning maps to the empty set; a
/// pair that was never separated has no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatingSets {
    names: Vec<Arc<str>>,
    index: FxHashMap<Arc<str>, usize>,
    sets: BTreeMap<(usize, usize), ConditioningSet>,
}

impl SeparatingSets {
    pub(crate) fn new(names: Vec<Arc<str>>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self {
            names,
            index,
            sets: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, a: usize, b: usize, set: ConditioningSet) {
        self.sets.insert(pair_key(a, b), set);
    }

    pub(crate) fn get_indices(&self, a: usize, b: usize) -> Option<&[usize]> {
        self.sets.get(&pair_key(a, b)).map(|s| s.as_slice())
    }

    /// The set that separated `a` and `b`, in registration order.
    ///
    /// `None` if the pair was never separated (or a name is unknown).
    pub fn get(&self, a: &str, b: &str) -> Option<Vec<&str>> {
        let (a, b) = (*self.index.get(a)?, *self.index.get(b)?);
        self.get_indices(a, b)
            .map(|set| set.iter().map(|&z| &*self.names[z]).collect())
    }

    /// True iff `a` and `b` were separated and `z` is in their separating set.
    pub fn separates_with(&self, a: &str, b: &str, z: &str) -> bool {
        self.get(a, b).is_some_and(|set| set.contains(&z))
    }

    /// Every separated pair with its set, in canonical pair order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, Vec<&str>)> + '_ {
        self.sets.iter().map(|(&(a, b), set)| {
            (
                &*self.names[a],
                &*self.names[b],
                set.iter().map(|&z| &*self.names[z]).collect(),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Lexicographic `k`-subsets of `items`, preserving item order.
pub(crate) struct Combinations<'a> {
    items: &'a [usize],
    cursor: Option<SmallVec<[usize; 4]>>,
}

impl<'a> Combinations<'a> {
    pub fn new(items: &'a [usize], k: usize) -> Self {
        let cursor = (k <= items.len()).then(|| (0..k).collect());
        Self { items, cursor }
    }
}

impl Iterator for Combinations<'_> {
    type Item = ConditioningSet;

    fn next(&mut self) -> Option<Self::Item> {
        let positions = self.cursor.as_mut()?;
        let current = positions.iter().map(|&p| self.items[p]).collect();

        let n = self.items.len();
        let k = positions.len();
        match (0..k).rev().find(|&i| positions[i] < n - k + i) {
            Some(i) => {
                positions[i] += 1;
                for j in i + 1..k {
                    positions[j] = positions[j - 1] + 1;
                }
            }
            None => self.cursor = None,
        }
        Some(current)
    }
}

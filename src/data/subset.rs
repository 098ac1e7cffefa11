//! Index sets identifying which samples a tree node is responsible for.

use std::collections::BTreeSet;
use std::collections::btree_set;

/// A set of unique dataset indices.
///
/// Backed by an ordered set so that every traversal (statistics, partitioning,
/// leaf scans) visits samples in the same order from run to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSubset {
    indices: BTreeSet<usize>,
}

impl DataSubset {
    pub fn new() -> Self {
        DataSubset {
            indices: BTreeSet::new(),
        }
    }

    /// The subset `0..len`.
    pub fn full(len: usize) -> Self {
        (0..len).collect()
    }

    /// Returns `true` if the index was not already present.
    pub fn insert(&mut self, index: usize) -> bool {
        self.indices.insert(index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

impl FromIterator<usize> for DataSubset {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        DataSubset {
            indices: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DataSubset {
    type Item = usize;
    type IntoIter = btree_set::IntoIter<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.into_iter()
    }
}

impl<'a> IntoIterator for &'a DataSubset {
    type Item = &'a usize;
    type IntoIter = btree_set::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}

//! Binary space-partitioning tree built top-down from a split factory and a
//! leaf payload factory.

use log::{debug, warn};

use super::leaf_data::LeafDataFactory;
use super::splitting::{SplittingCondition, SplittingConditionFactory};
use crate::data::{DataSubset, TrainingData};
use crate::errors::{ForestError, Result};

/// Tree structure. Leaves are stored out of line in the tree's leaf array and
/// referenced here by leaf number.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Internal {
        condition: SplittingCondition,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf(usize),
}

/// A terminal node: its payload and the samples it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<D> {
    number: usize,
    data: D,
    subset: DataSubset,
}

impl<D> Leaf<D> {
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn subset(&self) -> &DataSubset {
        &self.subset
    }
}

/// Hands out leaf numbers while growing. A splice reuses the displaced leaf's
/// number for its first new leaf and appends the rest.
struct LeafNumbers {
    reuse: Option<usize>,
    next: usize,
}

impl LeafNumbers {
    fn take(&mut self) -> usize {
        self.reuse.take().unwrap_or_else(|| {
            self.next += 1;
            self.next - 1
        })
    }
}

fn grow<S, F>(
    data: TrainingData<'_>,
    subset: DataSubset,
    split_factory: &mut S,
    leaf_factory: &F,
    numbers: &mut LeafNumbers,
    leaves: &mut Vec<Leaf<F::Data>>,
) -> Result<Node>
where
    S: SplittingConditionFactory,
    F: LeafDataFactory,
{
    if !subset.is_empty() && !split_factory.is_leaf(data, &subset)? {
        let condition = split_factory.create_splitting_condition(data, &subset)?;
        let (left, right) = condition.partition(data.inputs(), &subset);
        if !left.is_empty() && !right.is_empty() {
            let left = grow(data, left, split_factory, leaf_factory, numbers, leaves)?;
            let right = grow(data, right, split_factory, leaf_factory, numbers, leaves)?;
            return Ok(Node::Internal {
                condition,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        warn!(
            "split on dim {} at {} leaves a side empty, keeping {} samples in one leaf",
            condition.dimension(),
            condition.threshold(),
            subset.len()
        );
    }

    let number = numbers.take();
    let payload = leaf_factory.create_leaf_data(data, &subset, number)?;
    leaves.push(Leaf {
        number,
        data: payload,
        subset,
    });
    Ok(Node::Leaf(number))
}

/// Replaces the leaf that `point` routes to with `subtree`.
fn splice(node: &mut Node, point: &[f64], subtree: Node) {
    match *node {
        Node::Internal {
            ref condition,
            ref mut left,
            ref mut right,
        } => {
            let child = if condition.goes_left(point) { left } else { right };
            splice(child, point, subtree);
        }
        Node::Leaf(_) => *node = subtree,
    }
}

/// Renumbers leaves left to right, recording the previous numbers in traversal order.
fn renumber(node: &mut Node, previous: &mut Vec<usize>) {
    match node {
        Node::Internal { left, right, .. } => {
            renumber(left, previous);
            renumber(right, previous);
        }
        Node::Leaf(number) => {
            previous.push(*number);
            *number = previous.len() - 1;
        }
    }
}

fn depth_of(node: &Node) -> usize {
    match node {
        Node::Internal { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
        Node::Leaf(_) => 0,
    }
}

/// A binary tree over a [`crate::data::DataSet`].
///
/// The tree keeps its factories so that [`Tree::add_new_input`] can regrow
/// parts of it the same way they were first built. It does not keep the data;
/// operations that need samples take a [`TrainingData`] view.
pub struct Tree<S, F: LeafDataFactory> {
    root: Node,
    leaves: Vec<Leaf<F::Data>>,
    dimension: usize,
    split_factory: S,
    leaf_factory: F,
}

impl<S, F: LeafDataFactory> Tree<S, F> {
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Leaves indexed by leaf number.
    pub fn leaves(&self) -> &[Leaf<F::Data>] {
        &self.leaves
    }

    pub fn leaf(&self, number: usize) -> Option<&Leaf<F::Data>> {
        self.leaves.get(number)
    }

    /// Edges on the longest root-to-leaf path; 0 for a single-leaf tree.
    pub fn depth(&self) -> usize {
        depth_of(&self.root)
    }

    pub fn split_factory(&self) -> &S {
        &self.split_factory
    }

    pub fn leaf_factory(&self) -> &F {
        &self.leaf_factory
    }

    /// The leaf `vector` falls into.
    pub fn get_leaf(&self, vector: &[f64]) -> &Leaf<F::Data> {
        debug_assert_eq!(vector.len(), self.dimension);
        let mut node = &self.root;
        loop {
            match node {
                Node::Internal {
                    condition,
                    left,
                    right,
                } => node = if condition.goes_left(vector) { left.as_ref() } else { right.as_ref() },
                Node::Leaf(number) => return &self.leaves[*number],
            }
        }
    }

    /// Payload of the leaf `vector` falls into; the prediction for scalar payloads.
    pub fn get_output_value(&self, vector: &[f64]) -> &F::Data {
        &self.get_leaf(vector).data
    }

    /// Renumbers leaves `0..num_leaves` in left-to-right order. Numbering is
    /// already in that order after [`Tree::build`]; insertions can scramble it.
    pub fn create_leaves_array(&mut self) {
        let mut previous = Vec::with_capacity(self.leaves.len());
        renumber(&mut self.root, &mut previous);
        let mut old: Vec<Option<Leaf<F::Data>>> = std::mem::take(&mut self.leaves).into_iter().map(Some).collect();
        self.leaves = previous
            .into_iter()
            .enumerate()
            .filter_map(|(number, old_number)| {
                old[old_number].take().map(|mut leaf| {
                    leaf.number = number;
                    leaf
                })
            })
            .collect();
    }
}

impl<S, F> Tree<S, F>
where
    S: SplittingConditionFactory,
    F: LeafDataFactory,
{
    /// Grows a tree over every sample in `data`.
    pub fn build(data: TrainingData<'_>, mut split_factory: S, leaf_factory: F) -> Result<Self> {
        let mut numbers = LeafNumbers { reuse: None, next: 0 };
        let mut leaves = Vec::new();
        let root = grow(
            data,
            DataSubset::full(data.len()),
            &mut split_factory,
            &leaf_factory,
            &mut numbers,
            &mut leaves,
        )?;
        let tree = Tree {
            root,
            leaves,
            dimension: data.inputs().dimension(),
            split_factory,
            leaf_factory,
        };
        debug!(
            "built tree over {} samples: {} leaves, depth {}",
            data.len(),
            tree.num_leaves(),
            tree.depth()
        );
        Ok(tree)
    }

    /// Incorporates sample `index`, which must already be in `data`.
    ///
    /// The leaf the sample falls into is regrown over its samples plus the new
    /// one and spliced in where the leaf was. Every other leaf keeps its number.
    /// When the whole tree is a single leaf it is rebuilt from scratch over all
    /// of `data`.
    pub fn add_new_input(&mut self, data: TrainingData<'_>, index: usize) -> Result<()> {
        let point = data.inputs().get(index).ok_or(ForestError::IndexOutOfRange {
            index,
            len: data.len(),
        })?;

        if let Node::Leaf(_) = self.root {
            debug!("tree is a single leaf, rebuilding over {} samples", data.len());
            let mut numbers = LeafNumbers { reuse: None, next: 0 };
            let mut leaves = Vec::new();
            self.root = grow(
                data,
                DataSubset::full(data.len()),
                &mut self.split_factory,
                &self.leaf_factory,
                &mut numbers,
                &mut leaves,
            )?;
            self.leaves = leaves;
            return Ok(());
        }

        let displaced = self.get_leaf(point).number;
        let mut subset = self.leaves[displaced].subset.clone();
        subset.insert(index);

        let mut numbers = LeafNumbers {
            reuse: Some(displaced),
            next: self.leaves.len(),
        };
        let mut new_leaves = Vec::new();
        let subtree = grow(
            data,
            subset,
            &mut self.split_factory,
            &self.leaf_factory,
            &mut numbers,
            &mut new_leaves,
        )?;
        debug!(
            "replaced leaf {} with a subtree of {} leaves",
            displaced,
            new_leaves.len()
        );

        splice(&mut self.root, point, subtree);
        for leaf in new_leaves {
            let number = leaf.number;
            if number < self.leaves.len() {
                self.leaves[number] = leaf;
            } else {
                self.leaves.push(leaf);
            }
        }
        Ok(())
    }
}

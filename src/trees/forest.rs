//! Ensembles of independently grown trees.

use std::io::{self, Write};

use log::{debug, warn};

use super::leaf_data::{LeafDataFactory, RegressionLeafFactory, WeightedRbfLeafFactory};
use super::splitting::{ExtraTreesFactory, SplittingConditionFactory};
use super::tree::Tree;
use crate::config::ForestConfig;
use crate::data::TrainingData;
use crate::errors::Result;
use crate::knn::{NearestNeighborSearch, RepresentativeElements};

/// Fixed number of tree slots. Empty slots are skipped everywhere.
pub struct Forest<S, F: LeafDataFactory> {
    trees: Vec<Option<Tree<S, F>>>,
}

impl<S, F: LeafDataFactory> Forest<S, F> {
    /// A forest with `num_trees` empty slots.
    pub fn with_slots(num_trees: usize) -> Self {
        Forest {
            trees: (0..num_trees).map(|_| None).collect(),
        }
    }

    /// Number of slots, empty or not.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn tree(&self, slot: usize) -> Option<&Tree<S, F>> {
        self.trees.get(slot).and_then(Option::as_ref)
    }

    /// Puts `tree` into `slot`, returning what was there.
    ///
    /// # Panics
    /// If `slot` is out of range.
    pub fn set_tree(&mut self, slot: usize, tree: Option<Tree<S, F>>) -> Option<Tree<S, F>> {
        std::mem::replace(&mut self.trees[slot], tree)
    }

    /// The non-empty slots.
    pub fn trees(&self) -> impl Iterator<Item = &Tree<S, F>> + '_ {
        self.trees.iter().flatten()
    }

    fn average(&self, f: impl Fn(&Tree<S, F>) -> f64) -> f64 {
        let (sum, count) = self.trees().fold((0.0, 0usize), |(sum, count), tree| (sum + f(tree), count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    pub fn average_depth(&self) -> f64 {
        self.average(|tree| tree.depth() as f64)
    }

    pub fn average_leaves(&self) -> f64 {
        self.average(|tree| tree.num_leaves() as f64)
    }

    /// Writes `average_depth average_leaves` on one line.
    pub fn save_ascii(&self, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{} {}", self.average_depth(), self.average_leaves())
    }
}

impl<S, F> Forest<S, F>
where
    S: SplittingConditionFactory,
    F: LeafDataFactory + Clone,
{
    /// Grows `num_trees` trees over `data`. Tree `i` gets the split factory
    /// `make_split_factory(i)` and its own copy of `leaf_factory`.
    pub fn build(
        data: TrainingData<'_>,
        num_trees: usize,
        mut make_split_factory: impl FnMut(usize) -> S,
        leaf_factory: F,
    ) -> Result<Self> {
        let mut trees = Vec::with_capacity(num_trees);
        for slot in 0..num_trees {
            trees.push(Some(Tree::build(data, make_split_factory(slot), leaf_factory.clone())?));
        }
        let forest = Forest { trees };
        debug!(
            "built forest of {} trees: average depth {}, average leaves {}",
            num_trees,
            forest.average_depth(),
            forest.average_leaves()
        );
        Ok(forest)
    }

    /// Feeds sample `index` to every tree. See [`Tree::add_new_input`].
    ///
    /// Stops at the first tree that fails: earlier trees already hold the
    /// sample, later ones do not. Calling again with the same index is safe,
    /// since a tree that already holds it only regrows the leaf around it.
    pub fn add_new_input(&mut self, data: TrainingData<'_>, index: usize) -> Result<()> {
        for tree in self.trees.iter_mut().flatten() {
            tree.add_new_input(data, index)?;
        }
        Ok(())
    }
}

/// Splits every tree of a forest config with its own seeded Extra-Trees factory.
fn extra_trees_factories(config: &ForestConfig) -> impl FnMut(usize) -> ExtraTreesFactory + '_ {
    move |slot| {
        let mut tree_config = config.extra_trees.clone();
        tree_config.seed = tree_config.seed.map(|seed| seed.wrapping_add(slot as u64));
        ExtraTreesFactory::from_config(&tree_config)
    }
}

/// Averages the leaf means of its trees.
pub struct RegressionForest<S> {
    forest: Forest<S, RegressionLeafFactory>,
}

impl<S> RegressionForest<S> {
    pub fn new(forest: Forest<S, RegressionLeafFactory>) -> Self {
        RegressionForest { forest }
    }

    pub fn forest(&self) -> &Forest<S, RegressionLeafFactory> {
        &self.forest
    }

    pub fn forest_mut(&mut self) -> &mut Forest<S, RegressionLeafFactory> {
        &mut self.forest
    }

    /// Mean prediction of the non-empty slots, `None` if every slot is empty.
    pub fn predict(&self, input: &[f64]) -> Option<f64> {
        let (sum, count) = self
            .forest
            .trees()
            .fold((0.0, 0usize), |(sum, count), tree| (sum + *tree.get_output_value(input), count + 1));
        if count == 0 { None } else { Some(sum / count as f64) }
    }
}

impl RegressionForest<ExtraTreesFactory> {
    /// Extra-Trees regression forest. With a configured seed, tree `i` uses `seed + i`.
    pub fn from_config(data: TrainingData<'_>, config: &ForestConfig) -> Result<Self> {
        let forest = Forest::build(
            data,
            config.num_trees,
            extra_trees_factories(config),
            RegressionLeafFactory,
        )?;
        Ok(RegressionForest { forest })
    }
}

/// Combines Gaussian basis functions found by nearest-center search in each tree.
pub struct RbfForest<S> {
    forest: Forest<S, WeightedRbfLeafFactory>,
    num_neighbors: usize,
}

impl<S> RbfForest<S> {
    pub fn new(forest: Forest<S, WeightedRbfLeafFactory>, num_neighbors: usize) -> Self {
        RbfForest { forest, num_neighbors }
    }

    pub fn forest(&self) -> &Forest<S, WeightedRbfLeafFactory> {
        &self.forest
    }

    pub fn forest_mut(&mut self) -> &mut Forest<S, WeightedRbfLeafFactory> {
        &mut self.forest
    }

    pub fn num_neighbors(&self) -> usize {
        self.num_neighbors
    }

    /// `sum(a * w) / sum(a)` over the `num_neighbors` nearest basis functions
    /// of one tree, where `a` is each basis' activation at `input`.
    ///
    /// When every activation underflows the ratio is meaningless, so the
    /// weight of the nearest center is returned instead.
    fn tree_output(&self, tree: &Tree<S, WeightedRbfLeafFactory>, input: &[f64]) -> Option<f64> {
        let mut search = NearestNeighborSearch::new(tree, RepresentativeElements, self.num_neighbors);
        let neighbors = search.nearest_neighbors(input);
        let nearest = neighbors.first()?;

        let mut weighted = 0.0;
        let mut normalizer = 0.0;
        for neighbor in &neighbors {
            let basis = tree.leaves()[neighbor.item].data();
            let activation = basis.activation(input);
            weighted += activation * basis.weight;
            normalizer += activation;
        }

        if normalizer < f64::MIN_POSITIVE {
            warn!(
                "rbf activations underflow at {:?} (nearest center {} away), using nearest weight",
                input, nearest.distance
            );
            return Some(tree.leaves()[nearest.item].data().weight);
        }
        Some(weighted / normalizer)
    }

    /// Mean of the per-tree combinations, `None` if no tree produced one.
    pub fn predict(&self, input: &[f64]) -> Option<f64> {
        let (sum, count) = self
            .forest
            .trees()
            .filter_map(|tree| self.tree_output(tree, input))
            .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
        if count == 0 { None } else { Some(sum / count as f64) }
    }
}

impl RbfForest<ExtraTreesFactory> {
    pub fn from_config(data: TrainingData<'_>, config: &ForestConfig) -> Result<Self> {
        let forest = Forest::build(
            data,
            config.num_trees,
            extra_trees_factories(config),
            WeightedRbfLeafFactory::from_config(&config.rbf),
        )?;
        Ok(RbfForest {
            forest,
            num_neighbors: config.num_neighbors,
        })
    }
}

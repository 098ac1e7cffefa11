//! Axis-aligned split rules and the factories that choose them.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ExtraTreesConfig, MeanSplitConfig};
use crate::data::{DataSet, DataSubset, TrainingData};
use crate::errors::{ForestError, Result};

/// Which child of an internal node a vector is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Routes a vector left when `vector[dimension] < threshold`, right otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplittingCondition {
    dimension: usize,
    threshold: f64,
}

impl SplittingCondition {
    pub fn new(dimension: usize, threshold: f64) -> Self {
        SplittingCondition {
            dimension,
            threshold,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn goes_left(&self, vector: &[f64]) -> bool {
        vector[self.dimension] < self.threshold
    }

    pub fn side(&self, vector: &[f64]) -> Side {
        if self.goes_left(vector) { Side::Left } else { Side::Right }
    }

    /// Splits `subset` into the samples routed left and right.
    pub fn partition(&self, inputs: &DataSet, subset: &DataSubset) -> (DataSubset, DataSubset) {
        let mut left = DataSubset::new();
        let mut right = DataSubset::new();
        for index in subset.iter() {
            if self.goes_left(&inputs[index]) {
                left.insert(index);
            } else {
                right.insert(index);
            }
        }
        (left, right)
    }
}

/// Decides where a tree stops growing and how internal nodes split.
pub trait SplittingConditionFactory {
    /// `true` when `subset` should become a leaf.
    fn is_leaf(&self, data: TrainingData<'_>, subset: &DataSubset) -> Result<bool>;

    /// A split for a non-leaf `subset`. Only called with non-empty subsets.
    fn create_splitting_condition(
        &mut self,
        data: TrainingData<'_>,
        subset: &DataSubset,
    ) -> Result<SplittingCondition>;
}

/// Deterministic KD split: cut the widest dimension at its mean.
///
/// Older code calls this the "median" split. It has always used the mean and
/// downstream tuning depends on that, so the behaviour is kept as is.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanSplitFactory {
    min_leaf_samples: usize,
    min_variance_norm: f64,
}

impl MeanSplitFactory {
    pub fn new(min_leaf_samples: usize, min_variance_norm: f64) -> Self {
        MeanSplitFactory {
            min_leaf_samples,
            min_variance_norm,
        }
    }

    pub fn from_config(config: &MeanSplitConfig) -> Self {
        Self::new(config.min_leaf_samples, config.min_variance_norm)
    }
}

impl Default for MeanSplitFactory {
    fn default() -> Self {
        Self::from_config(&MeanSplitConfig::default())
    }
}

impl SplittingConditionFactory for MeanSplitFactory {
    fn is_leaf(&self, data: TrainingData<'_>, subset: &DataSubset) -> Result<bool> {
        Ok(subset.len() < self.min_leaf_samples
            || data.inputs().variance_norm(Some(subset), data.weights()) <= self.min_variance_norm)
    }

    fn create_splitting_condition(
        &mut self,
        data: TrainingData<'_>,
        subset: &DataSubset,
    ) -> Result<SplittingCondition> {
        let inputs = data.inputs();
        let bounds = inputs.bounds(Some(subset));

        let mut dimension = 0;
        let mut widest = f64::NEG_INFINITY;
        for (dim, &(min, max)) in bounds.iter().enumerate() {
            if max - min > widest {
                widest = max - min;
                dimension = dim;
            }
        }

        let sum: f64 = subset.iter().map(|index| inputs[index][dimension]).sum();
        let threshold = sum / subset.len() as f64;
        Ok(SplittingCondition::new(dimension, threshold))
    }
}

/// Randomized split in the style of Geurts' Extremely Randomized Trees.
///
/// Each trial draws a random dimension and a random threshold inside the
/// subset's range on that dimension, and scores the candidate by the negated
/// size-weighted target variance of the two children. The best valid
/// candidate out of `split_trials` trials wins.
#[derive(Debug, Clone)]
pub struct ExtraTreesFactory {
    split_trials: usize,
    min_leaf_samples: usize,
    output_threshold: f64,
    rng: StdRng,
}

impl ExtraTreesFactory {
    /// Hard cap on trials when no valid candidate has turned up yet.
    pub const MAX_TRIALS: usize = 200;
    /// Input variance norm at or below which a subset is a leaf.
    pub const MIN_VARIANCE_NORM: f64 = 0.0001;
    /// Candidates scoring above this are rejected.
    pub const MAX_VALID_SCORE: f64 = 0.5;
    /// Score of a candidate that leaves one child empty.
    pub const DEGENERATE_SCORE: f64 = 1.0;

    pub fn new(split_trials: usize, min_leaf_samples: usize, output_threshold: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        ExtraTreesFactory {
            split_trials,
            min_leaf_samples,
            output_threshold,
            rng,
        }
    }

    pub fn from_config(config: &ExtraTreesConfig) -> Self {
        Self::new(
            config.split_trials,
            config.min_leaf_samples,
            config.output_threshold,
            config.seed,
        )
    }

    /// `-(var_left * |left| + var_right * |right|) / |subset|`, or
    /// [`Self::DEGENERATE_SCORE`] when a side is empty.
    pub fn score(data: TrainingData<'_>, subset: &DataSubset, condition: &SplittingCondition) -> Result<f64> {
        let targets = data.targets()?;
        let (left, right) = condition.partition(data.inputs(), subset);
        if left.is_empty() || right.is_empty() {
            return Ok(Self::DEGENERATE_SCORE);
        }
        let left_part = targets.variance(Some(&left)) * left.len() as f64;
        let right_part = targets.variance(Some(&right)) * right.len() as f64;
        Ok(-(left_part + right_part) / subset.len() as f64)
    }
}

impl SplittingConditionFactory for ExtraTreesFactory {
    fn is_leaf(&self, data: TrainingData<'_>, subset: &DataSubset) -> Result<bool> {
        let targets = data.targets()?;
        Ok(subset.len() < self.min_leaf_samples
            || targets.variance(Some(subset)) < self.output_threshold
            || data.inputs().variance_norm(Some(subset), data.weights()) <= Self::MIN_VARIANCE_NORM)
    }

    fn create_splitting_condition(
        &mut self,
        data: TrainingData<'_>,
        subset: &DataSubset,
    ) -> Result<SplittingCondition> {
        let inputs = data.inputs();
        let dimensions = inputs.dimension();
        if dimensions == 0 {
            return Err(ForestError::SplitSearchExhausted { trials: 0 });
        }
        let bounds = inputs.bounds(Some(subset));

        let mut best: Option<(f64, SplittingCondition)> = None;
        let mut trials = 0;
        loop {
            match best {
                Some(_) if trials >= self.split_trials => break,
                None if trials >= Self::MAX_TRIALS => {
                    return Err(ForestError::SplitSearchExhausted { trials });
                }
                _ => {}
            }
            trials += 1;

            let dimension = self.rng.gen_range(0..dimensions);
            let (min, max) = bounds[dimension];
            if !(min < max) {
                // constant on this dimension, every threshold is degenerate
                continue;
            }
            // interpolate rather than sample `min..max`, whose width can overflow
            let u: f64 = self.rng.r#gen();
            let condition = SplittingCondition::new(dimension, min * (1.0 - u) + max * u);
            let score = Self::score(data, subset, &condition)?;
            if score <= Self::MAX_VALID_SCORE && best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
                best = Some((score, condition));
            }
        }

        match best {
            Some((score, condition)) => {
                debug!(
                    "extra-trees split on dim {} at {} (score {}, {} trials, {} samples)",
                    condition.dimension(),
                    condition.threshold(),
                    score,
                    trials,
                    subset.len()
                );
                Ok(condition)
            }
            None => Err(ForestError::SplitSearchExhausted { trials }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataSet1D;
    use approx::assert_relative_eq;

    fn square() -> (DataSet, DataSet1D) {
        let mut inputs = DataSet::new(2);
        let mut targets = DataSet1D::new();
        for (p, y) in [([0.0, 0.0], 0.0), ([0.0, 1.0], 0.0), ([1.0, 0.0], 1.0), ([1.0, 1.0], 1.0)] {
            inputs.add_input(&p);
            targets.push(y);
        }
        (inputs, targets)
    }

    #[test]
    fn test_condition_routing() {
        let condition = SplittingCondition::new(1, 2.0);
        assert!(condition.goes_left(&[10.0, 1.9]));
        assert_eq!(condition.side(&[0.0, 2.0]), Side::Right); // ties go right
    }

    #[test]
    fn test_partition() {
        let (inputs, _) = square();
        let condition = SplittingCondition::new(0, 0.5);
        let (left, right) = condition.partition(&inputs, &DataSubset::full(4));
        assert_eq!(left.iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(right.iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_mean_split_widest_dimension() {
        let mut inputs = DataSet::new(2);
        for p in [[0.0, 0.0], [1.0, 10.0], [2.0, 2.0]] {
            inputs.add_input(&p);
        }
        let mut factory = MeanSplitFactory::new(1, 0.0);
        let data = TrainingData::new(&inputs);
        let subset = DataSubset::full(3);
        assert!(!factory.is_leaf(data, &subset).unwrap());
        let condition = factory.create_splitting_condition(data, &subset).unwrap();
        assert_eq!(condition.dimension(), 1);
        assert_relative_eq!(condition.threshold(), 4.0); // mean, not median
    }

    #[test]
    fn test_mean_split_leaf_rules() {
        let (inputs, _) = square();
        let factory = MeanSplitFactory::new(3, 0.0);
        let data = TrainingData::new(&inputs);
        let pair: DataSubset = [0, 1].into_iter().collect();
        assert!(factory.is_leaf(data, &pair).unwrap()); // below n_min

        let mut duplicates = DataSet::new(1);
        for _ in 0..5 {
            duplicates.add_input(&[3.0]);
        }
        assert!(factory.is_leaf(TrainingData::new(&duplicates), &DataSubset::full(5)).unwrap());
    }

    #[test]
    fn test_score() {
        let (inputs, targets) = square();
        let data = TrainingData::with_targets(&inputs, &targets).unwrap();
        let subset = DataSubset::full(4);
        let by_x = ExtraTreesFactory::score(data, &subset, &SplittingCondition::new(0, 0.5)).unwrap();
        let by_y = ExtraTreesFactory::score(data, &subset, &SplittingCondition::new(1, 0.5)).unwrap();
        let empty = ExtraTreesFactory::score(data, &subset, &SplittingCondition::new(0, -1.0)).unwrap();
        assert_relative_eq!(by_x, 0.0);
        assert_relative_eq!(by_y, -0.25);
        assert_eq!(empty, ExtraTreesFactory::DEGENERATE_SCORE);
    }

    #[test]
    fn test_extra_trees_prefers_lowest_variance_split() {
        let (inputs, targets) = square();
        let data = TrainingData::with_targets(&inputs, &targets).unwrap();
        let subset = DataSubset::full(4);
        let mut factory = ExtraTreesFactory::new(50, 1, 0.0, Some(7));
        assert!(!factory.is_leaf(data, &subset).unwrap());
        let condition = factory.create_splitting_condition(data, &subset).unwrap();
        assert_eq!(condition.dimension(), 0);
        assert!(condition.threshold() > 0.0 && condition.threshold() < 1.0);
    }

    #[test]
    fn test_extra_trees_leaf_on_low_target_variance() {
        let (inputs, _) = square();
        let mut flat = DataSet1D::new();
        for _ in 0..4 {
            flat.push(2.0);
        }
        let data = TrainingData::with_targets(&inputs, &flat).unwrap();
        let factory = ExtraTreesFactory::new(5, 1, 0.01, Some(1));
        assert!(factory.is_leaf(data, &DataSubset::full(4)).unwrap());
    }

    #[test]
    fn test_extra_trees_leaf_on_duplicate_inputs() {
        let mut inputs = DataSet::new(2);
        let mut targets = DataSet1D::new();
        for y in [0.0, 5.0, -3.0] {
            inputs.add_input(&[1.0, 2.0]);
            targets.push(y);
        }
        let data = TrainingData::with_targets(&inputs, &targets).unwrap();
        let factory = ExtraTreesFactory::new(5, 1, 0.0, Some(1));
        assert!(targets.variance(None) > 0.0);
        assert!(factory.is_leaf(data, &DataSubset::full(3)).unwrap());
    }

    #[test]
    fn test_extra_trees_splits_full_float_range() {
        let mut inputs = DataSet::new(1);
        let mut targets = DataSet1D::new();
        for (x, y) in [(-1e308, 0.0), (1e308, 1.0)] {
            inputs.add_input(&[x]);
            targets.push(y);
        }
        let data = TrainingData::with_targets(&inputs, &targets).unwrap();
        let subset = DataSubset::full(2);
        let mut factory = ExtraTreesFactory::new(5, 1, 0.0, Some(1));
        let condition = factory.create_splitting_condition(data, &subset).unwrap();
        assert!(condition.threshold().is_finite());
        let (left, right) = condition.partition(&inputs, &subset);
        assert_eq!((left.len(), right.len()), (1, 1));
    }

    #[test]
    fn test_extra_trees_requires_targets() {
        let (inputs, _) = square();
        let factory = ExtraTreesFactory::new(5, 1, 0.0, Some(1));
        assert!(matches!(
            factory.is_leaf(TrainingData::new(&inputs), &DataSubset::full(4)),
            Err(ForestError::MissingTargets)
        ));
    }

    #[test]
    fn test_split_search_exhausted_on_unscorable_targets() {
        let (inputs, _) = square();
        let mut targets = DataSet1D::new();
        for _ in 0..4 {
            targets.push(f64::NAN);
        }
        let data = TrainingData::with_targets(&inputs, &targets).unwrap();
        let mut factory = ExtraTreesFactory::new(5, 1, 0.0, Some(3));
        match factory.create_splitting_condition(data, &DataSubset::full(4)) {
            Err(ForestError::SplitSearchExhausted { trials }) => assert_eq!(trials, ExtraTreesFactory::MAX_TRIALS),
            other => panic!("expected SplitSearchExhausted, got {:?}", other),
        }
    }
}

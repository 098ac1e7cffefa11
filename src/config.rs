//! Tuning knobs for the tree factories and forests.
//!
//! Every config has a `Default` built from its `DEFAULT_*` constants, so callers
//! usually start from `Default::default()` and override a field or two.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings for the deterministic widest-dimension mean split.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeanSplitConfig {
    /// Subsets with fewer samples than this become leaves (`n_min`).
    pub min_leaf_samples: usize,
    /// Subsets whose input variance norm is at or below this become leaves.
    pub min_variance_norm: f64,
}

impl MeanSplitConfig {
    pub const DEFAULT_MIN_LEAF_SAMPLES: usize = 2;
    pub const DEFAULT_MIN_VARIANCE_NORM: f64 = 1e-12;
}

impl Default for MeanSplitConfig {
    fn default() -> Self {
        MeanSplitConfig {
            min_leaf_samples: Self::DEFAULT_MIN_LEAF_SAMPLES,
            min_variance_norm: Self::DEFAULT_MIN_VARIANCE_NORM,
        }
    }
}

/// Settings for the randomized Extra-Trees split.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtraTreesConfig {
    /// Number of random split candidates scored per node (`K`). More trials are
    /// drawn when none of the first `K` is valid.
    pub split_trials: usize,
    /// Subsets with fewer samples than this become leaves (`n_min`).
    pub min_leaf_samples: usize,
    /// Subsets whose target variance is below this become leaves.
    pub output_threshold: f64,
    /// Seed for the split RNG; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl ExtraTreesConfig {
    pub const DEFAULT_SPLIT_TRIALS: usize = 5;
    pub const DEFAULT_MIN_LEAF_SAMPLES: usize = 2;
    pub const DEFAULT_OUTPUT_THRESHOLD: f64 = 0.0;
}

impl Default for ExtraTreesConfig {
    fn default() -> Self {
        ExtraTreesConfig {
            split_trials: Self::DEFAULT_SPLIT_TRIALS,
            min_leaf_samples: Self::DEFAULT_MIN_LEAF_SAMPLES,
            output_threshold: Self::DEFAULT_OUTPUT_THRESHOLD,
            seed: None,
        }
    }
}

/// Shape of the Gaussian basis functions stored at RBF leaves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RbfConfig {
    pub variance_multiplier: f64,
    /// Per-dimension floor applied to sigma.
    pub min_variance: f64,
}

impl RbfConfig {
    pub const DEFAULT_VARIANCE_MULTIPLIER: f64 = 1.0;
    pub const DEFAULT_MIN_VARIANCE: f64 = 1e-4;
}

impl Default for RbfConfig {
    fn default() -> Self {
        RbfConfig {
            variance_multiplier: Self::DEFAULT_VARIANCE_MULTIPLIER,
            min_variance: Self::DEFAULT_MIN_VARIANCE,
        }
    }
}

/// Settings shared by regression and RBF forests.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForestConfig {
    pub num_trees: usize,
    /// How many nearest basis functions each tree of an RBF forest combines.
    pub num_neighbors: usize,
    pub extra_trees: ExtraTreesConfig,
    pub rbf: RbfConfig,
}

impl ForestConfig {
    pub const DEFAULT_NUM_TREES: usize = 10;
    pub const DEFAULT_NUM_NEIGHBORS: usize = 5;
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            num_trees: Self::DEFAULT_NUM_TREES,
            num_neighbors: Self::DEFAULT_NUM_NEIGHBORS,
            extra_trees: ExtraTreesConfig::default(),
            rbf: RbfConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ForestConfig::default();
        assert_eq!(config.num_trees, ForestConfig::DEFAULT_NUM_TREES);
        assert_eq!(config.num_neighbors, ForestConfig::DEFAULT_NUM_NEIGHBORS);
        assert_eq!(config.extra_trees.split_trials, ExtraTreesConfig::DEFAULT_SPLIT_TRIALS);
        assert!(config.extra_trees.seed.is_none());
        assert_eq!(config.rbf, RbfConfig::default());
        assert_eq!(MeanSplitConfig::default().min_leaf_samples, 2);
    }
}

//! Binary space partitioning trees and the forests built from them.

pub mod forest;
pub mod leaf_data;
pub mod splitting;
pub mod tree;

pub use forest::{Forest, RbfForest, RegressionForest};
pub use leaf_data::{
    CentroidLeafFactory, LeafDataFactory, RbfLeafFactory, RegressionLeafFactory, SubsetLeafFactory,
    WeightedRbfLeafFactory,
};
pub use splitting::{ExtraTreesFactory, MeanSplitFactory, Side, SplittingCondition, SplittingConditionFactory};
pub use tree::{Leaf, Node, Tree};

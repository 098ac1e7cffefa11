//! Binary space partitioning trees over real-valued vectors: mean-split and
//! Extra-Trees growth, exact nearest-neighbour and range search, and
//! regression and RBF forests.

pub mod common_types;
pub mod config;
pub mod data;
pub mod errors;
pub mod knn;
pub mod mapping;
pub mod rbf;
pub mod trees;

#[cfg(feature = "python")]
mod python;

pub use config::{ExtraTreesConfig, ForestConfig, MeanSplitConfig, RbfConfig};
pub use data::{DataSet, DataSet1D, DataSubset, TrainingData};
pub use errors::{ForestError, Result};
pub use mapping::Mapping;
pub use trees::{Forest, RbfForest, RegressionForest, Tree};

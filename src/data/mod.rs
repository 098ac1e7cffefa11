//! Training samples: input vectors, scalar targets and index subsets.

pub mod dataset;
pub mod subset;

pub use dataset::{DataSet, DataSet1D, TrainingData};
pub use subset::DataSubset;

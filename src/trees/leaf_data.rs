//! Payloads computed for each leaf when a tree is built.
//!
//! Leaves own their payload and drop it together with the leaf. A payload that
//! holds external resources releases them in its own `Drop` impl.

use crate::config::RbfConfig;
use crate::data::{DataSubset, TrainingData};
use crate::errors::Result;
use crate::rbf::{RbfBasis, WeightedRbf};

/// Computes the payload stored at a leaf from the samples it holds.
pub trait LeafDataFactory {
    type Data;

    fn create_leaf_data(
        &self,
        data: TrainingData<'_>,
        subset: &DataSubset,
        leaf_number: usize,
    ) -> Result<Self::Data>;
}

/// Weighted target mean, the prediction of a regression tree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegressionLeafFactory;

impl LeafDataFactory for RegressionLeafFactory {
    type Data = f64;

    fn create_leaf_data(&self, data: TrainingData<'_>, subset: &DataSubset, _leaf_number: usize) -> Result<f64> {
        Ok(data.targets()?.mean(Some(subset)))
    }
}

/// Copy of the leaf's sample indices.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubsetLeafFactory;

impl LeafDataFactory for SubsetLeafFactory {
    type Data = DataSubset;

    fn create_leaf_data(&self, _data: TrainingData<'_>, subset: &DataSubset, _leaf_number: usize) -> Result<DataSubset> {
        Ok(subset.clone())
    }
}

/// Vector quantization: the leaf's centroid.
///
/// The centroid is the unweighted mean. A weighted mean can leave the leaf's
/// cell (every weight zero gives the origin), and nearest-representative
/// search relies on representatives lying inside their cells.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CentroidLeafFactory;

impl LeafDataFactory for CentroidLeafFactory {
    type Data = Vec<f64>;

    fn create_leaf_data(&self, data: TrainingData<'_>, subset: &DataSubset, _leaf_number: usize) -> Result<Vec<f64>> {
        Ok(data.inputs().mean(Some(subset), None))
    }
}

/// Gaussian basis centered on the unweighted leaf mean.
///
/// Sigma is the per-dimension variance scaled by `variance_multiplier` and
/// floored at `min_variance`, so single-sample leaves still get a usable kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct RbfLeafFactory {
    variance_multiplier: f64,
    min_variance: f64,
}

impl RbfLeafFactory {
    pub fn new(variance_multiplier: f64, min_variance: f64) -> Self {
        RbfLeafFactory {
            variance_multiplier,
            min_variance,
        }
    }

    pub fn from_config(config: &RbfConfig) -> Self {
        Self::new(config.variance_multiplier, config.min_variance)
    }

    fn basis(&self, data: TrainingData<'_>, subset: &DataSubset) -> RbfBasis {
        let inputs = data.inputs();
        let center = inputs.mean(Some(subset), None);
        let sigma = inputs
            .variance(Some(subset), None)
            .into_iter()
            .map(|v| (v * self.variance_multiplier).max(self.min_variance))
            .collect();
        RbfBasis::new(center, sigma)
    }
}

impl Default for RbfLeafFactory {
    fn default() -> Self {
        Self::from_config(&RbfConfig::default())
    }
}

impl LeafDataFactory for RbfLeafFactory {
    type Data = RbfBasis;

    fn create_leaf_data(&self, data: TrainingData<'_>, subset: &DataSubset, _leaf_number: usize) -> Result<RbfBasis> {
        Ok(self.basis(data, subset))
    }
}

/// Gaussian basis plus an output weight for RBF regression.
///
/// The weight is the target mean with every sample weighted by its own
/// activation under the leaf's kernel. If all activations underflow it falls
/// back to the plain target mean.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedRbfLeafFactory {
    basis: RbfLeafFactory,
}

impl WeightedRbfLeafFactory {
    pub fn new(variance_multiplier: f64, min_variance: f64) -> Self {
        WeightedRbfLeafFactory {
            basis: RbfLeafFactory::new(variance_multiplier, min_variance),
        }
    }

    pub fn from_config(config: &RbfConfig) -> Self {
        WeightedRbfLeafFactory {
            basis: RbfLeafFactory::from_config(config),
        }
    }
}

impl LeafDataFactory for WeightedRbfLeafFactory {
    type Data = WeightedRbf;

    fn create_leaf_data(&self, data: TrainingData<'_>, subset: &DataSubset, _leaf_number: usize) -> Result<WeightedRbf> {
        let targets = data.targets()?;
        let inputs = data.inputs();
        let basis = self.basis.basis(data, subset);

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for index in subset.iter() {
            let weight = targets.weight(index) * basis.activation(&inputs[index]);
            weighted_sum += weight * targets.values()[index];
            total_weight += weight;
        }
        let weight = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            targets.mean(Some(subset))
        };
        Ok(WeightedRbf { basis, weight })
    }
}

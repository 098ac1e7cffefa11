//! Gaussian radial basis functions stored at the leaves of RBF trees.

/// A point that stands in for a whole leaf during nearest-neighbour search.
///
/// The representative must lie inside the leaf's cell (a mean of the leaf's
/// samples does), otherwise the search's rectangle lower bound is not valid.
pub trait LeafRepresentative {
    fn representative(&self) -> &[f64];
}

impl LeafRepresentative for Vec<f64> {
    fn representative(&self) -> &[f64] {
        self
    }
}

/// Axis-aligned Gaussian kernel. `sigma` holds one variance per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct RbfBasis {
    pub center: Vec<f64>,
    pub sigma: Vec<f64>,
}

impl RbfBasis {
    pub fn new(center: Vec<f64>, sigma: Vec<f64>) -> Self {
        debug_assert_eq!(center.len(), sigma.len());
        RbfBasis { center, sigma }
    }

    /// `exp(-0.5 * sum_d (x_d - c_d)^2 / sigma_d)`, in `(0, 1]`.
    pub fn activation(&self, x: &[f64]) -> f64 {
        let exponent: f64 = x
            .iter()
            .zip(self.center.iter())
            .zip(self.sigma.iter())
            .map(|((&xi, &ci), &si)| {
                let diff = xi - ci;
                diff * diff / si
            })
            .sum();
        (-0.5 * exponent).exp()
    }
}

impl LeafRepresentative for RbfBasis {
    fn representative(&self) -> &[f64] {
        &self.center
    }
}

/// A basis function with the output weight it contributes in a regression.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRbf {
    pub basis: RbfBasis,
    pub weight: f64,
}

impl WeightedRbf {
    pub fn activation(&self, x: &[f64]) -> f64 {
        self.basis.activation(x)
    }
}

impl LeafRepresentative for WeightedRbf {
    fn representative(&self) -> &[f64] {
        &self.basis.center
    }
}

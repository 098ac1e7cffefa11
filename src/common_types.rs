//! Small numeric helpers shared by the tree, search and RBF code.

use num_traits::Float;
use std::iter::Sum;

/// Squared Euclidean distance between two feature vectors of equal length.
pub fn squared_distance<F>(a: &[F], b: &[F]) -> F
where
    F: Float + Sum,
{
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Euclidean distance between two feature vectors.
pub fn euclidean_distance<F>(a: &[F], b: &[F]) -> F
where
    F: Float + Sum,
{
    squared_distance(a, b).sqrt()
}

/// Euclidean norm of a vector.
pub fn norm<F>(v: &[F]) -> F
where
    F: Float + Sum,
{
    v.iter().map(|&x| x * x).sum::<F>().sqrt()
}

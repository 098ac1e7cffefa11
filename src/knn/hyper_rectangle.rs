//! Axis-aligned boxes bounding the cell a subtree covers during a search.

/// Per-dimension closed `[min, max]` bounds, unbounded by default.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperRectangle {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl HyperRectangle {
    /// The whole space.
    pub fn unbounded(dimension: usize) -> Self {
        HyperRectangle {
            min: vec![f64::NEG_INFINITY; dimension],
            max: vec![f64::INFINITY; dimension],
        }
    }

    /// # Panics
    /// If the bound vectors differ in length.
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        assert_eq!(min.len(), max.len(), "min and max bounds must have the same dimension");
        HyperRectangle { min, max }
    }

    pub fn dimension(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Squared distance from `point` to the nearest point of the box; 0 inside.
    pub fn distance_squared_to(&self, point: &[f64]) -> f64 {
        point
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .map(|(&x, (&lo, &hi))| {
                let gap = if x < lo {
                    lo - x
                } else if x > hi {
                    x - hi
                } else {
                    0.0
                };
                gap * gap
            })
            .sum()
    }

    pub fn contains(&self, point: &[f64]) -> bool {
        point
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(&x, (&lo, &hi))| lo <= x && x <= hi)
    }

    pub fn intersects(&self, other: &HyperRectangle) -> bool {
        (0..self.dimension()).all(|d| self.min[d] <= other.max[d] && other.min[d] <= self.max[d])
    }

    /// Runs `f` with the upper bound on `dimension` lowered to `threshold`
    /// (never raised), restoring the previous bound afterwards.
    pub fn with_max<R>(&mut self, dimension: usize, threshold: f64, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.max[dimension];
        self.max[dimension] = saved.min(threshold);
        let result = f(self);
        self.max[dimension] = saved;
        result
    }

    /// Runs `f` with the lower bound on `dimension` raised to `threshold`
    /// (never lowered), restoring the previous bound afterwards.
    pub fn with_min<R>(&mut self, dimension: usize, threshold: f64, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.min[dimension];
        self.min[dimension] = saved.max(threshold);
        let result = f(self);
        self.min[dimension] = saved;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_box() {
        let rect = HyperRectangle::new(vec![0.0, 0.0], vec![1.0, 1.0]);
        assert_eq!(rect.distance_squared_to(&[0.5, 0.5]), 0.0);
        assert_eq!(rect.distance_squared_to(&[2.0, 0.5]), 1.0);
        assert_eq!(rect.distance_squared_to(&[-1.0, 3.0]), 5.0);
        assert_eq!(HyperRectangle::unbounded(2).distance_squared_to(&[1e9, -1e9]), 0.0);
    }

    #[test]
    fn test_contains_and_intersects() {
        let rect = HyperRectangle::new(vec![0.0, 0.0], vec![1.0, 1.0]);
        assert!(rect.contains(&[1.0, 0.0])); // closed bounds
        assert!(!rect.contains(&[1.1, 0.0]));
        assert!(rect.intersects(&HyperRectangle::new(vec![1.0, 0.5], vec![2.0, 2.0])));
        assert!(!rect.intersects(&HyperRectangle::new(vec![1.5, 0.5], vec![2.0, 2.0])));
    }

    #[test]
    fn test_scoped_restriction_restores_bounds() {
        let mut rect = HyperRectangle::unbounded(2);
        let inner = rect.with_max(0, 3.0, |r| {
            r.with_min(1, -2.0, |r| {
                assert_eq!(r.max()[0], 3.0);
                r.with_max(0, 5.0, |r| r.max()[0]) // looser bound is ignored
            })
        });
        assert_eq!(inner, 3.0);
        assert_eq!(rect, HyperRectangle::unbounded(2));
    }
}

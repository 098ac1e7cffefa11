//! Owned sample collections and their weighted statistics.

use std::io::{BufRead, Write};
use std::ops::Index;

use super::subset::DataSubset;
use crate::common_types::norm;
use crate::errors::{ForestError, Result};

/// Yields the indices of `subset`, or every index below `len` when no subset is given.
fn indices<'a>(subset: Option<&'a DataSubset>, len: usize) -> Box<dyn Iterator<Item = usize> + 'a> {
    match subset {
        Some(subset) => Box::new(subset.iter()),
        None => Box::new(0..len),
    }
}

/// Clamps rounding noise below zero without hiding NaN.
fn non_negative(value: f64) -> f64 {
    if value < 0.0 { 0.0 } else { value }
}

fn parse_fields(fields: &[&str], line: usize) -> Result<Vec<f64>> {
    fields
        .iter()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|source| ForestError::ParseFloat { line, source })
        })
        .collect()
}

/// An ordered collection of fixed-dimension input vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    dimension: usize,
    inputs: Vec<Vec<f64>>,
}

impl DataSet {
    pub fn new(dimension: usize) -> Self {
        DataSet {
            dimension,
            inputs: Vec::new(),
        }
    }

    /// Copies `input` into the set.
    ///
    /// # Panics
    /// If `input` does not have the set's dimension.
    pub fn add_input(&mut self, input: &[f64]) {
        if input.len() != self.dimension {
            panic!(
                "All inputs must have the same dimension. Found input with {} values, expected {}.",
                input.len(),
                self.dimension
            );
        }
        self.inputs.push(input.to_vec());
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[f64]> {
        self.inputs.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.inputs.iter().map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.inputs.clear();
    }

    /// Weighted per-dimension average of `f(dim, value)` over the subset.
    fn weighted_average<G>(&self, subset: Option<&DataSubset>, weights: Option<&DataSet1D>, f: G) -> Vec<f64>
    where
        G: Fn(usize, f64) -> f64,
    {
        let mut sum = vec![0.0; self.dimension];
        let mut total_weight = 0.0;

        for index in indices(subset, self.len()) {
            let weight = weights.map_or(1.0, |w| w.weight(index));
            total_weight += weight;
            for (dim, &value) in self.inputs[index].iter().enumerate() {
                sum[dim] += weight * f(dim, value);
            }
        }

        if total_weight > 0.0 {
            for value in sum.iter_mut() {
                *value /= total_weight;
            }
        }
        sum
    }

    /// Weighted mean of the subset (or of the whole set when `subset` is `None`).
    /// Sample weights come from `weights` and default to 1. An empty subset yields zeros.
    pub fn mean(&self, subset: Option<&DataSubset>, weights: Option<&DataSet1D>) -> Vec<f64> {
        self.weighted_average(subset, weights, |_, value| value)
    }

    /// Per-dimension weighted mean of `(x - mean)²`. Two passes, so a single
    /// point has zero variance even at magnitudes where `x²` overflows.
    pub fn variance(&self, subset: Option<&DataSubset>, weights: Option<&DataSet1D>) -> Vec<f64> {
        let mean = self.mean(subset, weights);
        self.weighted_average(subset, weights, |dim, value| {
            let diff = value - mean[dim];
            diff * diff
        })
    }

    /// Euclidean norm of [`DataSet::variance`]; near zero means the subset is
    /// (almost) a single point.
    pub fn variance_norm(&self, subset: Option<&DataSubset>, weights: Option<&DataSet1D>) -> f64 {
        norm(&self.variance(subset, weights))
    }

    /// Observed `(min, max)` per dimension. Empty subsets give `(inf, -inf)`.
    pub fn bounds(&self, subset: Option<&DataSubset>) -> Vec<(f64, f64)> {
        let mut bounds = vec![(f64::INFINITY, f64::NEG_INFINITY); self.dimension];
        for index in indices(subset, self.len()) {
            for (dim, &value) in self.inputs[index].iter().enumerate() {
                bounds[dim].0 = bounds[dim].0.min(value);
                bounds[dim].1 = bounds[dim].1.max(value);
            }
        }
        bounds
    }

    /// Reads one sample per line, `dimension` whitespace-separated floats each.
    /// Blank lines are skipped.
    pub fn load_ascii<R: BufRead>(reader: R, dimension: usize) -> Result<Self> {
        let mut data = DataSet::new(dimension);
        for (line_idx, line) in reader.lines().enumerate() {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != dimension {
                return Err(ForestError::MalformedRow {
                    line: line_idx + 1,
                    expected: dimension,
                    found: fields.len(),
                });
            }
            data.inputs.push(parse_fields(&fields, line_idx + 1)?);
        }
        Ok(data)
    }

    pub fn save_ascii<W: Write>(&self, writer: &mut W) -> Result<()> {
        for input in &self.inputs {
            let line: Vec<String> = input.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

impl Index<usize> for DataSet {
    type Output = [f64];

    fn index(&self, index: usize) -> &[f64] {
        &self.inputs[index]
    }
}

/// Scalar targets parallel to a [`DataSet`], with optional per-sample weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet1D {
    values: Vec<f64>,
    weights: Option<Vec<f64>>,
}

impl DataSet1D {
    pub fn new() -> Self {
        DataSet1D::default()
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
        if let Some(weights) = self.weights.as_mut() {
            weights.push(1.0);
        }
    }

    pub fn push_weighted(&mut self, value: f64, weight: f64) {
        let len = self.values.len();
        self.weights.get_or_insert_with(|| vec![1.0; len]).push(weight);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_weighted(&self) -> bool {
        self.weights.is_some()
    }

    /// Weight of sample `index`; 1 for unweighted sets.
    pub fn weight(&self, index: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[index])
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.weights = None;
    }

    /// Mean where sample `i` counts with `weight(i) * extra_weight(i)`.
    /// Returns 0 when the total weight is zero.
    pub fn mean_weighted_by<W>(&self, subset: Option<&DataSubset>, extra_weight: W) -> f64
    where
        W: Fn(usize) -> f64,
    {
        let mut sum = 0.0;
        let mut total_weight = 0.0;
        for index in indices(subset, self.len()) {
            let weight = self.weight(index) * extra_weight(index);
            sum += weight * self.values[index];
            total_weight += weight;
        }
        if total_weight > 0.0 { sum / total_weight } else { 0.0 }
    }

    pub fn mean(&self, subset: Option<&DataSubset>) -> f64 {
        self.mean_weighted_by(subset, |_| 1.0)
    }

    /// Weighted `E[y²] - E[y]²`, clamped at zero.
    pub fn variance(&self, subset: Option<&DataSubset>) -> f64 {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut total_weight = 0.0;
        for index in indices(subset, self.len()) {
            let weight = self.weight(index);
            let value = self.values[index];
            sum += weight * value;
            sum_sq += weight * value * value;
            total_weight += weight;
        }
        if total_weight <= 0.0 {
            return 0.0;
        }
        let mean = sum / total_weight;
        non_negative(sum_sq / total_weight - mean * mean)
    }

    /// Reads one `value` or `value weight` per line. All lines must use the
    /// same layout as the first one.
    pub fn load_ascii<R: BufRead>(reader: R) -> Result<Self> {
        let mut data = DataSet1D::new();
        let mut expected = None;
        for (line_idx, line) in reader.lines().enumerate() {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            let width = *expected.get_or_insert(fields.len().min(2));
            if fields.len() != width {
                return Err(ForestError::MalformedRow {
                    line: line_idx + 1,
                    expected: width,
                    found: fields.len(),
                });
            }
            let values = parse_fields(&fields, line_idx + 1)?;
            if width == 2 {
                data.push_weighted(values[0], values[1]);
            } else {
                data.push(values[0]);
            }
        }
        Ok(data)
    }

    pub fn save_ascii<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (index, value) in self.values.iter().enumerate() {
            match &self.weights {
                Some(weights) => writeln!(writer, "{} {}", value, weights[index])?,
                None => writeln!(writer, "{}", value)?,
            }
        }
        Ok(())
    }
}

/// Borrowed view over the inputs (and optionally the targets) a tree is built from.
#[derive(Debug, Clone, Copy)]
pub struct TrainingData<'a> {
    inputs: &'a DataSet,
    targets: Option<&'a DataSet1D>,
}

impl<'a> TrainingData<'a> {
    /// Inputs only, for trees that never look at targets (e.g. nearest-neighbour indexes).
    pub fn new(inputs: &'a DataSet) -> Self {
        TrainingData {
            inputs,
            targets: None,
        }
    }

    pub fn with_targets(inputs: &'a DataSet, targets: &'a DataSet1D) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(ForestError::TargetLengthMismatch {
                inputs: inputs.len(),
                targets: targets.len(),
            });
        }
        Ok(TrainingData {
            inputs,
            targets: Some(targets),
        })
    }

    pub fn inputs(&self) -> &'a DataSet {
        self.inputs
    }

    pub fn targets(&self) -> Result<&'a DataSet1D> {
        self.targets.ok_or(ForestError::MissingTargets)
    }

    /// Per-sample weights for input statistics: the target weights when targets are present.
    pub fn weights(&self) -> Option<&'a DataSet1D> {
        self.targets
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;
    use std::panic;

    fn square() -> DataSet {
        let mut data = DataSet::new(2);
        for p in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]] {
            data.add_input(&p);
        }
        data
    }

    #[test]
    fn test_add_input_wrong_dimension_panics() {
        let result = panic::catch_unwind(|| {
            let mut data = DataSet::new(2);
            data.add_input(&[1.0]);
        });
        assert!(result.is_err(), "add_input should panic on a dimension mismatch");
    }

    #[test]
    fn test_mean_and_variance_whole_set() {
        let data = square();
        assert_eq!(data.mean(None, None), vec![0.5, 0.5]);
        assert_eq!(data.variance(None, None), vec![0.25, 0.25]);
        assert_relative_eq!(data.variance_norm(None, None), (0.125_f64).sqrt());
    }

    #[test]
    fn test_statistics_over_subset() {
        let data = square();
        let subset: DataSubset = [0, 1].into_iter().collect();
        assert_eq!(data.mean(Some(&subset), None), vec![0.0, 0.5]);
        assert_eq!(data.variance(Some(&subset), None), vec![0.0, 0.25]);
        assert_eq!(data.bounds(Some(&subset)), vec![(0.0, 0.0), (0.0, 1.0)]);
    }

    #[test]
    fn test_variance_of_huge_values() {
        let mut data = DataSet::new(1);
        data.add_input(&[1e308]);
        data.add_input(&[-1e308]);
        let single: DataSubset = [0].into_iter().collect();
        assert_eq!(data.variance(Some(&single), None), vec![0.0]);
        assert_eq!(data.variance(None, None), vec![f64::INFINITY]);
    }

    #[test]
    fn test_weighted_mean() {
        let data = square();
        let mut weights = DataSet1D::new();
        for w in [3.0, 1.0, 0.0, 0.0] {
            weights.push_weighted(0.0, w);
        }
        assert_eq!(data.mean(None, Some(&weights)), vec![0.0, 0.25]);
    }

    #[test]
    fn test_empty_subset_statistics_are_zero() {
        let data = square();
        let empty = DataSubset::new();
        assert_eq!(data.mean(Some(&empty), None), vec![0.0, 0.0]);
        assert_eq!(data.variance_norm(Some(&empty), None), 0.0);
        assert_eq!(DataSet1D::new().mean(None), 0.0);
    }

    #[test]
    fn test_targets_weighting() {
        let mut targets = DataSet1D::new();
        targets.push(1.0);
        targets.push(3.0);
        assert!(!targets.is_weighted());
        assert_relative_eq!(targets.mean(None), 2.0);
        assert_relative_eq!(targets.variance(None), 1.0);

        targets.push_weighted(5.0, 2.0);
        assert!(targets.is_weighted());
        assert_eq!(targets.weight(0), 1.0);
        // (1 + 3 + 2*5) / 4
        assert_relative_eq!(targets.mean(None), 3.5);
        assert_relative_eq!(targets.mean_weighted_by(None, |i| if i == 0 { 1.0 } else { 0.0 }), 1.0);
    }

    #[test]
    fn test_ascii_round_trip() {
        let data = square();
        let mut buffer = Vec::new();
        data.save_ascii(&mut buffer).unwrap();
        let loaded = DataSet::load_ascii(Cursor::new(buffer), 2).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_load_rejects_wrong_field_count() {
        let text = "1 2\n3 4 5\n";
        match DataSet::load_ascii(Cursor::new(text), 2) {
            Err(ForestError::MalformedRow { line, expected, found }) => {
                assert_eq!((line, expected, found), (2, 2, 3));
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_bad_number() {
        let text = "1 x\n";
        assert!(matches!(
            DataSet::load_ascii(Cursor::new(text), 2),
            Err(ForestError::ParseFloat { line: 1, .. })
        ));
    }

    #[test]
    fn test_targets_ascii_with_weights() {
        let text = "1.5 2\n\n-3 1\n";
        let targets = DataSet1D::load_ascii(Cursor::new(text)).unwrap();
        assert_eq!(targets.values(), &[1.5, -3.0]);
        assert_eq!(targets.weight(0), 2.0);

        let mut buffer = Vec::new();
        targets.save_ascii(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "1.5 2\n-3 1\n");

        assert!(DataSet1D::load_ascii(Cursor::new("1\n2 3\n")).is_err());
    }

    #[test]
    fn test_training_data_checks_lengths() {
        let data = square();
        let mut targets = DataSet1D::new();
        targets.push(1.0);
        assert!(matches!(
            TrainingData::with_targets(&data, &targets),
            Err(ForestError::TargetLengthMismatch { inputs: 4, targets: 1 })
        ));
        assert!(matches!(TrainingData::new(&data).targets(), Err(ForestError::MissingTargets)));
    }
}

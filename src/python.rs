//! Python bindings, built with the `python` feature.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::common_types::euclidean_distance;
use crate::config::{ExtraTreesConfig, ForestConfig, MeanSplitConfig};
use crate::data::{DataSet, DataSet1D, TrainingData};
use crate::errors::ForestError;
use crate::knn::{HyperRectangle, NearestNeighborSearch, RangeSearch, SampleElements};
use crate::trees::{ExtraTreesFactory, MeanSplitFactory, RbfForest, RegressionForest, SubsetLeafFactory, Tree};

fn to_py_err(err: ForestError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn dataset_from_rows(rows: Vec<Vec<f64>>) -> PyResult<DataSet> {
    let dimension = rows
        .first()
        .map(Vec::len)
        .ok_or_else(|| PyValueError::new_err("Input rows cannot be empty."))?;
    let mut data = DataSet::new(dimension);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != dimension {
            return Err(PyValueError::new_err(format!(
                "Row {} has {} features, expected {}.",
                i,
                row.len(),
                dimension
            )));
        }
        data.add_input(row);
    }
    Ok(data)
}

fn targets_from_values(values: Vec<f64>) -> DataSet1D {
    let mut targets = DataSet1D::new();
    for value in values {
        targets.push(value);
    }
    targets
}

fn check_dimension(point: &[f64], dimension: usize) -> PyResult<()> {
    if point.len() != dimension {
        return Err(PyValueError::new_err(format!(
            "Point has {} features, expected {}.",
            point.len(),
            dimension
        )));
    }
    Ok(())
}

fn forest_config(
    num_trees: usize,
    num_neighbors: usize,
    split_trials: usize,
    min_leaf_samples: usize,
    output_threshold: f64,
    seed: Option<u64>,
) -> ForestConfig {
    ForestConfig {
        num_trees,
        num_neighbors,
        extra_trees: ExtraTreesConfig {
            split_trials,
            min_leaf_samples,
            output_threshold,
            seed,
        },
        ..ForestConfig::default()
    }
}

/// Euclidean distance between two vectors of the same length.
#[pyfunction]
#[pyo3(name = "euclidean_distance")]
fn euclidean_distance_py(a: Vec<f64>, b: Vec<f64>) -> PyResult<f64> {
    if a.len() != b.len() {
        return Err(PyValueError::new_err("Input vectors must have the same length."));
    }
    Ok(euclidean_distance(&a, &b))
}

#[pyclass(name = "RegressionForest")]
struct PyRegressionForest {
    forest: RegressionForest<ExtraTreesFactory>,
    dimension: usize,
}

#[pymethods]
impl PyRegressionForest {
    #[new]
    #[pyo3(signature = (
        inputs,
        targets,
        num_trees = ForestConfig::DEFAULT_NUM_TREES,
        split_trials = ExtraTreesConfig::DEFAULT_SPLIT_TRIALS,
        min_leaf_samples = ExtraTreesConfig::DEFAULT_MIN_LEAF_SAMPLES,
        output_threshold = ExtraTreesConfig::DEFAULT_OUTPUT_THRESHOLD,
        seed = None
    ))]
    fn new(
        inputs: Vec<Vec<f64>>,
        targets: Vec<f64>,
        num_trees: usize,
        split_trials: usize,
        min_leaf_samples: usize,
        output_threshold: f64,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let inputs = dataset_from_rows(inputs)?;
        let targets = targets_from_values(targets);
        let data = TrainingData::with_targets(&inputs, &targets).map_err(to_py_err)?;
        let config = forest_config(
            num_trees,
            ForestConfig::DEFAULT_NUM_NEIGHBORS,
            split_trials,
            min_leaf_samples,
            output_threshold,
            seed,
        );
        let forest = RegressionForest::from_config(data, &config).map_err(to_py_err)?;
        Ok(PyRegressionForest {
            forest,
            dimension: inputs.dimension(),
        })
    }

    fn predict_single(&self, point: Vec<f64>) -> PyResult<f64> {
        check_dimension(&point, self.dimension)?;
        Ok(self.forest.predict(&point).unwrap_or(0.0))
    }

    fn predict(&self, points: Vec<Vec<f64>>) -> PyResult<Vec<f64>> {
        points.into_iter().map(|point| self.predict_single(point)).collect()
    }

    #[getter]
    fn average_depth(&self) -> f64 {
        self.forest.forest().average_depth()
    }

    #[getter]
    fn average_leaves(&self) -> f64 {
        self.forest.forest().average_leaves()
    }
}

#[pyclass(name = "RbfForest")]
struct PyRbfForest {
    forest: RbfForest<ExtraTreesFactory>,
    dimension: usize,
}

#[pymethods]
impl PyRbfForest {
    #[new]
    #[pyo3(signature = (
        inputs,
        targets,
        num_trees = ForestConfig::DEFAULT_NUM_TREES,
        num_neighbors = ForestConfig::DEFAULT_NUM_NEIGHBORS,
        split_trials = ExtraTreesConfig::DEFAULT_SPLIT_TRIALS,
        min_leaf_samples = ExtraTreesConfig::DEFAULT_MIN_LEAF_SAMPLES,
        output_threshold = ExtraTreesConfig::DEFAULT_OUTPUT_THRESHOLD,
        seed = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        inputs: Vec<Vec<f64>>,
        targets: Vec<f64>,
        num_trees: usize,
        num_neighbors: usize,
        split_trials: usize,
        min_leaf_samples: usize,
        output_threshold: f64,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let inputs = dataset_from_rows(inputs)?;
        let targets = targets_from_values(targets);
        let data = TrainingData::with_targets(&inputs, &targets).map_err(to_py_err)?;
        let config = forest_config(
            num_trees,
            num_neighbors,
            split_trials,
            min_leaf_samples,
            output_threshold,
            seed,
        );
        let forest = RbfForest::from_config(data, &config).map_err(to_py_err)?;
        Ok(PyRbfForest {
            forest,
            dimension: inputs.dimension(),
        })
    }

    fn predict_single(&self, point: Vec<f64>) -> PyResult<f64> {
        check_dimension(&point, self.dimension)?;
        Ok(self.forest.predict(&point).unwrap_or(0.0))
    }

    fn predict(&self, points: Vec<Vec<f64>>) -> PyResult<Vec<f64>> {
        points.into_iter().map(|point| self.predict_single(point)).collect()
    }
}

/// Exact k-nearest-neighbour and range index over a mean-split tree.
#[pyclass(name = "KdIndex")]
struct PyKdIndex {
    data: DataSet,
    tree: Tree<MeanSplitFactory, SubsetLeafFactory>,
}

#[pymethods]
impl PyKdIndex {
    #[new]
    #[pyo3(signature = (points, min_leaf_samples = MeanSplitConfig::DEFAULT_MIN_LEAF_SAMPLES))]
    fn new(points: Vec<Vec<f64>>, min_leaf_samples: usize) -> PyResult<Self> {
        let data = dataset_from_rows(points)?;
        let split = MeanSplitFactory::from_config(&MeanSplitConfig {
            min_leaf_samples,
            ..MeanSplitConfig::default()
        });
        let tree = Tree::build(TrainingData::new(&data), split, SubsetLeafFactory).map_err(to_py_err)?;
        Ok(PyKdIndex { data, tree })
    }

    /// `(index, distance)` pairs of the `k` nearest points, closest first.
    fn query(&self, point: Vec<f64>, k: usize) -> PyResult<Vec<(usize, f64)>> {
        check_dimension(&point, self.data.dimension())?;
        let mut search = NearestNeighborSearch::new(&self.tree, SampleElements::new(&self.data), k);
        Ok(search
            .nearest_neighbors(&point)
            .into_iter()
            .map(|n| (n.item, n.distance))
            .collect())
    }

    /// Indices of the points inside the closed box `[min, max]`.
    fn query_range(&self, min: Vec<f64>, max: Vec<f64>) -> PyResult<Vec<usize>> {
        check_dimension(&min, self.data.dimension())?;
        check_dimension(&max, self.data.dimension())?;
        Ok(RangeSearch::new(&self.tree, &self.data).search(&HyperRectangle::new(min, max)))
    }

    fn __len__(&self) -> usize {
        self.data.len()
    }
}

/// The module name must match `lib.name` in `Cargo.toml`.
#[pymodule]
fn bsp_forest(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(euclidean_distance_py, m)?)?;
    m.add_class::<PyRegressionForest>()?;
    m.add_class::<PyRbfForest>()?;
    m.add_class::<PyKdIndex>()?;
    Ok(())
}

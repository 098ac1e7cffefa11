//! Tree searches checked against linear scans over random data.

use approx::assert_relative_eq;
use bsp_forest::common_types::euclidean_distance;
use bsp_forest::data::{DataSet, DataSet1D, TrainingData};
use bsp_forest::knn::{HyperRectangle, NearestNeighborSearch, RangeSearch, SampleElements};
use bsp_forest::trees::{ExtraTreesFactory, LeafDataFactory, MeanSplitFactory, SubsetLeafFactory, Tree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NUM_POINTS: usize = 2000;
const NUM_QUERIES: usize = 100;

fn random_points(rng: &mut StdRng, n: usize, dimension: usize) -> DataSet {
    let mut data = DataSet::new(dimension);
    for _ in 0..n {
        let point: Vec<f64> = (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect();
        data.add_input(&point);
    }
    data
}

fn random_query(rng: &mut StdRng, dimension: usize) -> Vec<f64> {
    (0..dimension).map(|_| rng.gen_range(-1.2..1.2)).collect()
}

fn brute_force(data: &DataSet, query: &[f64], k: usize) -> Vec<(usize, f64)> {
    let mut all: Vec<(usize, f64)> = data
        .iter()
        .enumerate()
        .map(|(i, p)| (i, euclidean_distance(query, p)))
        .collect();
    all.sort_by(|a, b| a.1.total_cmp(&b.1));
    all.truncate(k);
    all
}

fn check_knn<S, F: LeafDataFactory>(tree: &Tree<S, F>, data: &DataSet, rng: &mut StdRng) {
    let mut search = NearestNeighborSearch::new(tree, SampleElements::new(data), 1);
    for _ in 0..NUM_QUERIES {
        let query = random_query(rng, data.dimension());
        for k in [1, 5, 10] {
            let found = search.get_nearest_neighbors(&query, k);
            let expected = brute_force(data, &query, k);
            assert_eq!(found.len(), expected.len());
            for (n, (index, distance)) in found.iter().zip(expected) {
                assert_eq!(n.item, index, "k={k} query={query:?}");
                assert_relative_eq!(n.distance, distance, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn test_mean_split_knn_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(1);
    for dimension in 1..=5 {
        let data = random_points(&mut rng, NUM_POINTS, dimension);
        let tree = Tree::build(TrainingData::new(&data), MeanSplitFactory::new(8, 0.0), SubsetLeafFactory).unwrap();
        check_knn(&tree, &data, &mut rng);
    }
}

#[test]
fn test_extra_trees_knn_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(2);
    for dimension in 1..=5 {
        let data = random_points(&mut rng, NUM_POINTS, dimension);
        let mut targets = DataSet1D::new();
        for point in data.iter() {
            targets.push(point.iter().sum());
        }
        let training = TrainingData::with_targets(&data, &targets).unwrap();
        let tree = Tree::build(training, ExtraTreesFactory::new(3, 5, 0.0, Some(dimension as u64)), SubsetLeafFactory)
            .unwrap();
        check_knn(&tree, &data, &mut rng);
    }
}

#[test]
fn test_range_search_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(3);
    for dimension in 1..=5 {
        let data = random_points(&mut rng, NUM_POINTS, dimension);
        let tree = Tree::build(TrainingData::new(&data), MeanSplitFactory::new(8, 0.0), SubsetLeafFactory).unwrap();
        let search = RangeSearch::new(&tree, &data);

        for _ in 0..NUM_QUERIES {
            let (min, max): (Vec<f64>, Vec<f64>) = (0..dimension)
                .map(|_| {
                    let a = rng.gen_range(-1.2..1.2);
                    let b = rng.gen_range(-1.2..1.2);
                    if a <= b { (a, b) } else { (b, a) }
                })
                .unzip();
            let query = HyperRectangle::new(min, max);
            let expected: Vec<usize> = data
                .iter()
                .enumerate()
                .filter(|(_, p)| query.contains(p))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(search.search(&query), expected);
        }
    }
}

#[test]
fn test_nearest_to_corner_of_unit_square() {
    let mut data = DataSet::new(2);
    for point in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]] {
        data.add_input(&point);
    }
    let tree = Tree::build(TrainingData::new(&data), MeanSplitFactory::new(1, 0.0), SubsetLeafFactory).unwrap();
    let mut search = NearestNeighborSearch::new(&tree, SampleElements::new(&data), 1);
    let found = search.nearest_neighbors(&[0.9, 0.9]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].item, 3);
    assert_eq!(&data[found[0].item], &[1.0, 1.0]);
}

//! Orthogonal range queries: every sample inside a query box.

use super::hyper_rectangle::HyperRectangle;
use crate::data::DataSet;
use crate::trees::leaf_data::LeafDataFactory;
use crate::trees::tree::{Node, Tree};

/// Range query over the samples stored in a tree's leaves.
pub struct RangeSearch<'t, S, F: LeafDataFactory> {
    tree: &'t Tree<S, F>,
    inputs: &'t DataSet,
}

impl<'t, S, F: LeafDataFactory> RangeSearch<'t, S, F> {
    pub fn new(tree: &'t Tree<S, F>, inputs: &'t DataSet) -> Self {
        RangeSearch { tree, inputs }
    }

    /// Indices of all samples inside `query` (closed bounds), ascending.
    pub fn search(&self, query: &HyperRectangle) -> Vec<usize> {
        debug_assert_eq!(query.dimension(), self.tree.dimension());
        let mut cell = HyperRectangle::unbounded(self.tree.dimension());
        let mut found = Vec::new();
        self.collect(self.tree.root(), query, &mut cell, &mut found);
        found.sort_unstable();
        found
    }

    fn collect(&self, node: &Node, query: &HyperRectangle, cell: &mut HyperRectangle, found: &mut Vec<usize>) {
        if !cell.intersects(query) {
            return;
        }
        match node {
            Node::Leaf(number) => {
                let leaf = &self.tree.leaves()[*number];
                found.extend(
                    leaf.subset()
                        .iter()
                        .filter(|&index| query.distance_squared_to(&self.inputs[index]) == 0.0),
                );
            }
            Node::Internal {
                condition,
                left,
                right,
            } => {
                let (dim, threshold) = (condition.dimension(), condition.threshold());
                cell.with_max(dim, threshold, |c| self.collect(left, query, c, found));
                cell.with_min(dim, threshold, |c| self.collect(right, query, c, found));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TrainingData;
    use crate::trees::leaf_data::SubsetLeafFactory;
    use crate::trees::splitting::MeanSplitFactory;

    #[test]
    fn test_range_query() {
        let mut data = DataSet::new(2);
        for i in 0..10 {
            for j in 0..10 {
                data.add_input(&[i as f64, j as f64]);
            }
        }
        let tree = Tree::build(TrainingData::new(&data), MeanSplitFactory::new(4, 0.0), SubsetLeafFactory).unwrap();
        let search = RangeSearch::new(&tree, &data);

        let query = HyperRectangle::new(vec![2.0, 3.0], vec![4.0, 3.5]);
        let expected: Vec<usize> = vec![2 * 10 + 3, 3 * 10 + 3, 4 * 10 + 3];
        assert_eq!(search.search(&query), expected);

        let outside = HyperRectangle::new(vec![20.0, 20.0], vec![30.0, 30.0]);
        assert!(search.search(&outside).is_empty());

        let everything = HyperRectangle::unbounded(2);
        assert_eq!(search.search(&everything).len(), 100);
    }
}

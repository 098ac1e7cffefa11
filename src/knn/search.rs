//! Exact k-nearest-neighbour search over a [`Tree`] by branch and bound.
//!
//! The search walks the tree keeping the hyper-rectangle of the current cell.
//! A child is only entered while the distance from the query to the child's
//! rectangle is below the K-th best distance found so far. That distance is a
//! lower bound for every element stored below the child, so pruning never
//! drops a true neighbour.

use super::heap_utils::{KBestNeighbors, Neighbor};
use super::hyper_rectangle::HyperRectangle;
use crate::common_types::squared_distance;
use crate::data::DataSet;
use crate::rbf::LeafRepresentative;
use crate::trees::leaf_data::LeafDataFactory;
use crate::trees::splitting::{Side, SplittingCondition};
use crate::trees::tree::{Leaf, Node, Tree};

/// Turns a leaf into search candidates.
///
/// Implementations offer every element of `leaf` to `best` with its squared
/// distance to `point`. Every offered element must lie inside `rectangle`.
pub trait LeafElements<D> {
    type Item: Clone;

    fn add_data_elements(
        &self,
        point: &[f64],
        leaf: &Leaf<D>,
        rectangle: &HyperRectangle,
        best: &mut KBestNeighbors<Self::Item>,
    );
}

/// Candidates are the raw samples held by each leaf; items are sample indices.
#[derive(Debug, Clone, Copy)]
pub struct SampleElements<'a> {
    inputs: &'a DataSet,
}

impl<'a> SampleElements<'a> {
    pub fn new(inputs: &'a DataSet) -> Self {
        SampleElements { inputs }
    }
}

impl<D> LeafElements<D> for SampleElements<'_> {
    type Item = usize;

    fn add_data_elements(
        &self,
        point: &[f64],
        leaf: &Leaf<D>,
        _rectangle: &HyperRectangle,
        best: &mut KBestNeighbors<usize>,
    ) {
        for index in leaf.subset().iter() {
            best.add(squared_distance(point, &self.inputs[index]), index);
        }
    }
}

/// One candidate per leaf, its representative point; items are leaf numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepresentativeElements;

impl<D: LeafRepresentative> LeafElements<D> for RepresentativeElements {
    type Item = usize;

    fn add_data_elements(
        &self,
        point: &[f64],
        leaf: &Leaf<D>,
        _rectangle: &HyperRectangle,
        best: &mut KBestNeighbors<usize>,
    ) {
        best.add(squared_distance(point, leaf.data().representative()), leaf.number());
    }
}

/// Reusable K-nearest-neighbour query bound to one tree.
pub struct NearestNeighborSearch<'t, S, F, A>
where
    F: LeafDataFactory,
    A: LeafElements<F::Data>,
{
    tree: &'t Tree<S, F>,
    elements: A,
    k: usize,
    best: KBestNeighbors<A::Item>,
}

impl<'t, S, F, A> NearestNeighborSearch<'t, S, F, A>
where
    F: LeafDataFactory,
    A: LeafElements<F::Data>,
{
    /// `k` is the neighbourhood size used by [`Self::nearest_neighbors`].
    pub fn new(tree: &'t Tree<S, F>, elements: A, k: usize) -> Self {
        NearestNeighborSearch {
            tree,
            elements,
            k,
            best: KBestNeighbors::new(k),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// The `k` elements nearest to `point`, closest first. Exact under
    /// Euclidean distance; ties are broken by visiting order.
    pub fn get_nearest_neighbors(&mut self, point: &[f64], k: usize) -> Vec<Neighbor<A::Item>> {
        debug_assert_eq!(point.len(), self.tree.dimension());
        self.best.reset(k);
        if k == 0 {
            return Vec::new();
        }
        let tree = self.tree;
        let mut rectangle = HyperRectangle::unbounded(tree.dimension());
        self.descend(tree.root(), point, &mut rectangle);
        self.best
            .iter()
            .map(|(distance, item)| Neighbor {
                distance: distance.sqrt(),
                item: item.clone(),
            })
            .collect()
    }

    /// [`Self::get_nearest_neighbors`] with the default `k`.
    pub fn nearest_neighbors(&mut self, point: &[f64]) -> Vec<Neighbor<A::Item>> {
        self.get_nearest_neighbors(point, self.k)
    }

    /// Distance to the single nearest element, `None` if the tree holds none.
    pub fn get_nearest_neighbor_distance(&mut self, point: &[f64]) -> Option<f64> {
        self.get_nearest_neighbors(point, 1).first().map(|n| n.distance)
    }

    fn worth_visiting(&self, lower_bound: f64) -> bool {
        self.best
            .current_farthest_distance()
            .map_or(true, |worst| lower_bound < worst)
    }

    fn descend(&mut self, node: &'t Node, point: &[f64], rectangle: &mut HyperRectangle) {
        match node {
            Node::Leaf(number) => {
                let leaf = &self.tree.leaves()[*number];
                self.elements.add_data_elements(point, leaf, rectangle, &mut self.best);
            }
            Node::Internal {
                condition,
                left,
                right,
            } => {
                let (dim, threshold) = (condition.dimension(), condition.threshold());
                let left_bound = rectangle.with_max(dim, threshold, |r| r.distance_squared_to(point));
                let right_bound = rectangle.with_min(dim, threshold, |r| r.distance_squared_to(point));

                let (near, near_bound, far, far_bound) = if left_bound <= right_bound {
                    ((left, Side::Left), left_bound, (right, Side::Right), right_bound)
                } else {
                    ((right, Side::Right), right_bound, (left, Side::Left), left_bound)
                };

                if self.worth_visiting(near_bound) {
                    self.descend_side(near.0, near.1, condition, point, rectangle);
                }
                if self.worth_visiting(far_bound) {
                    self.descend_side(far.0, far.1, condition, point, rectangle);
                }
            }
        }
    }

    fn descend_side(
        &mut self,
        child: &'t Node,
        side: Side,
        condition: &SplittingCondition,
        point: &[f64],
        rectangle: &mut HyperRectangle,
    ) {
        let (dim, threshold) = (condition.dimension(), condition.threshold());
        match side {
            Side::Left => rectangle.with_max(dim, threshold, |r| self.descend(child, point, r)),
            Side::Right => rectangle.with_min(dim, threshold, |r| self.descend(child, point, r)),
        }
    }
}

//! Exact nearest-neighbour and range search over partitioning trees.

pub mod heap_utils;
pub mod hyper_rectangle;
pub mod range_search;
pub mod search;

pub use heap_utils::{KBestNeighbors, Neighbor};
pub use hyper_rectangle::HyperRectangle;
pub use range_search::RangeSearch;
pub use search::{LeafElements, NearestNeighborSearch, RepresentativeElements, SampleElements};

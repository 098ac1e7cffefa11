//! Bounded buffer of the K best (smallest distance) candidates seen so far.

use ordered_float::OrderedFloat;

/// A candidate paired with its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<P> {
    pub distance: f64,
    pub item: P,
}

/// Keeps the `capacity` smallest-distance items in ascending order.
///
/// Insertion is a binary search plus a shift; the buffer is sorted at all times.
#[derive(Debug, Clone)]
pub struct KBestNeighbors<P> {
    capacity: usize,
    entries: Vec<(OrderedFloat<f64>, P)>,
}

impl<P> KBestNeighbors<P> {
    pub fn new(capacity: usize) -> Self {
        KBestNeighbors {
            capacity,
            entries: Vec::with_capacity(capacity + 1), // one extra slot for insert-then-truncate
        }
    }

    /// Empties the buffer and sets a new capacity, keeping the allocation.
    pub fn reset(&mut self, capacity: usize) {
        self.entries.clear();
        self.capacity = capacity;
        self.entries.reserve(capacity + 1);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Offers a candidate; kept only if it beats the current K-th best.
    pub fn add(&mut self, distance: f64, item: P) {
        if self.capacity == 0 {
            return;
        }
        let key = OrderedFloat(distance);
        if self.is_full() && key >= self.entries[self.capacity - 1].0 {
            return;
        }
        let position = self.entries.partition_point(|(d, _)| *d <= key);
        self.entries.insert(position, (key, item));
        self.entries.truncate(self.capacity);
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Distance of the K-th best candidate; `None` until K candidates are known.
    pub fn current_farthest_distance(&self) -> Option<f64> {
        if self.is_full() && self.capacity > 0 {
            self.entries.last().map(|(d, _)| d.0)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &P)> + '_ {
        self.entries.iter().map(|(d, item)| (d.0, item))
    }

    pub fn into_sorted_points(self) -> Vec<P> {
        self.entries.into_iter().map(|(_, item)| item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_best_neighbors_logic() {
        let mut k_best = KBestNeighbors::new(3);

        k_best.add(10.0, "P10");
        k_best.add(5.0, "P5");
        assert_eq!(k_best.current_farthest_distance(), None); // not full yet
        k_best.add(12.0, "P12");

        assert_eq!(k_best.len(), 3);
        assert_eq!(k_best.current_farthest_distance(), Some(12.0));

        k_best.add(4.0, "P4"); // pushes P12 out
        assert_eq!(k_best.len(), 3);
        assert_eq!(k_best.current_farthest_distance(), Some(10.0));

        k_best.add(15.0, "P15"); // worse than everything kept
        assert_eq!(k_best.current_farthest_distance(), Some(10.0));

        assert_eq!(k_best.into_sorted_points(), vec!["P4", "P5", "P10"]);
    }

    #[test]
    fn test_reset_and_zero_capacity() {
        let mut k_best = KBestNeighbors::new(0);
        k_best.add(1.0, 1);
        assert!(k_best.is_empty());
        assert_eq!(k_best.current_farthest_distance(), None);

        k_best.reset(2);
        k_best.add(3.0, 3);
        k_best.add(1.0, 1);
        k_best.add(2.0, 2);
        assert_eq!(k_best.iter().map(|(d, &i)| (d, i)).collect::<Vec<_>>(), vec![(1.0, 1), (2.0, 2)]);
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let mut k_best = KBestNeighbors::new(2);
        k_best.add(1.0, "a");
        k_best.add(1.0, "b");
        k_best.add(1.0, "c");
        assert_eq!(k_best.into_sorted_points(), vec!["a", "b"]);
    }
}

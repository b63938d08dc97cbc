//! Spatial indexing for fast radius queries over mesh vertices
//!
//! This module is only available with the `spatial-index` feature.

use glam::DVec3;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// Wrapper around KD-tree for vertex proximity queries
///
/// Used by vertex welding to find every earlier vertex within the weld
/// tolerance without an all-pairs scan.
///
/// # Performance
///
/// - Construction: O(n log n)
/// - Query: O(log n + k) for k results
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, u64, 3, 32>,
}

impl SpatialIndex {
    /// Build spatial index from vertex positions
    ///
    /// # Arguments
    ///
    /// * `points` - Positions; query results refer to indices into this slice
    ///
    /// # Example
    ///
    /// ```
    /// use globe_regions::SpatialIndex;
    /// use glam::DVec3;
    ///
    /// let points = vec![
    ///     DVec3::new(1.0, 0.0, 0.0),
    ///     DVec3::new(0.0, 1.0, 0.0),
    ///     DVec3::new(1.0005, 0.0, 0.0),
    /// ];
    ///
    /// let index = SpatialIndex::new(&points);
    /// let mut near = index.within_radius(DVec3::X, 0.001);
    /// near.sort_unstable();
    /// assert_eq!(near, vec![0, 2]);
    /// ```
    pub fn new(points: &[DVec3]) -> Self {
        let points: Vec<[f64; 3]> = points.iter().map(|p| p.to_array()).collect();

        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
        }
    }

    /// Indices of all points strictly closer than `radius` to `position`
    ///
    /// Results are unordered.
    pub fn within_radius(&self, position: DVec3, radius: f64) -> Vec<usize> {
        let radius_sq = radius * radius;
        self.tree
            .within_unsorted::<SquaredEuclidean>(&position.to_array(), radius_sq)
            .into_iter()
            .filter(|n| n.distance < radius_sq)
            .map(|n| n.item as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_radius_basic() {
        let points = vec![
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(-1.0, 0.0, 0.0),
        ];

        let index = SpatialIndex::new(&points);

        assert_eq!(index.within_radius(DVec3::new(0.9, 0.1, 0.0), 0.5), vec![0]);
        assert_eq!(index.within_radius(DVec3::new(0.0, 0.95, 0.0), 0.1), vec![1]);
        assert!(index.within_radius(DVec3::ZERO, 0.5).is_empty());

        let mut all = index.within_radius(DVec3::ZERO, 1.5);
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_within_radius_duplicates() {
        let points = vec![DVec3::splat(10.0); 20];
        let index = SpatialIndex::new(&points);
        assert_eq!(index.within_radius(DVec3::splat(10.0), 1e-3).len(), 20);
    }

    #[test]
    fn test_within_radius_is_strict() {
        let points = vec![DVec3::ZERO, DVec3::new(0.5, 0.0, 0.0)];
        let index = SpatialIndex::new(&points);
        assert_eq!(index.within_radius(DVec3::ZERO, 0.5), vec![0]);
    }
}

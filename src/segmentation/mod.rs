use crate::math::Point3;

/// Two disjoint subsets of a point cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmenterResult {
    /// Points within the threshold of the reference.
    pub inner: Vec<Point3>,
    /// Points beyond the threshold.
    pub outer: Vec<Point3>,
}

impl SegmenterResult {
    /// Total number of points across both subsets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len() + self.outer.len()
    }

    /// Returns `true` if both subsets are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty() && self.outer.is_empty()
    }
}

/// Splits a point cloud into an inner and an outer subset around a reference.
pub trait ColourSegmenter {
    /// Partitions `points` relative to `reference` at `approximate_radius`.
    fn segment(
        &self,
        points: &[Point3],
        reference: &Point3,
        approximate_radius: f64,
    ) -> SegmenterResult;
}

/// Segments by Euclidean distance: a point is inner iff
/// `|point - reference|^2 <= approximate_radius^2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceSegmenter;

impl ColourSegmenter for DistanceSegmenter {
    fn segment(
        &self,
        points: &[Point3],
        reference: &Point3,
        approximate_radius: f64,
    ) -> SegmenterResult {
        let radius_sq = approximate_radius * approximate_radius;
        let (inner, outer) = points
            .iter()
            .copied()
            .partition(|p| (p - reference).norm_squared() <= radius_sq);
        SegmenterResult { inner, outer }
    }
}

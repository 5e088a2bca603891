use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3};

/// Picks a single reference colour to represent a background point cloud.
pub trait BackgroundColourLocator {
    /// Returns the dominant colour of `points`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyPointCloud`] if `points` is empty.
    fn find_colour(&self, points: &[Point3]) -> Result<Point3>;
}

/// Uses the barycentre (arithmetic mean) of the background cloud.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarycentreLocator;

impl BackgroundColourLocator for BarycentreLocator {
    #[allow(clippy::cast_precision_loss)]
    fn find_colour(&self, points: &[Point3]) -> Result<Point3> {
        if points.is_empty() {
            return Err(GeometryError::EmptyPointCloud.into());
        }
        let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Ok(Point3::from(sum / points.len() as f64))
    }
}

use crate::error::{GeometryError, Result};

use super::{Point3, TOLERANCE};

/// A sphere enclosing a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center of the sphere.
    pub center: Point3,
    /// Radius of the sphere.
    pub radius: f64,
}

impl BoundingSphere {
    /// Returns `true` if `point` lies within the sphere, allowing `slack`.
    #[must_use]
    pub fn contains(&self, point: &Point3, slack: f64) -> bool {
        (point - self.center).norm() <= self.radius + slack
    }
}

/// Computes a sphere that encloses every point of a cloud.
///
/// Used as a primitive by shell positioning; implementations need not return
/// the minimal sphere, but the result must contain all input points.
pub trait BoundingSphereOracle {
    /// Returns a sphere enclosing all of `points`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyPointCloud`] if `points` is empty.
    fn bounding_sphere(&self, points: &[Point3]) -> Result<BoundingSphere>;
}

/// Ritter-style approximate enclosing sphere.
///
/// Starts at the first point with radius `tolerance`, runs two growth passes
/// that pull the center towards outlying points, then a final pass that grows
/// the sphere just enough to take in anything still outside.
#[derive(Debug, Clone, Copy)]
pub struct RitterOracle {
    tolerance: f64,
}

impl RitterOracle {
    /// Creates an oracle whose spheres are never smaller than `tolerance`.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(TOLERANCE),
        }
    }

    /// Returns the seed radius.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for RitterOracle {
    fn default() -> Self {
        Self::new(1e-4)
    }
}

impl BoundingSphereOracle for RitterOracle {
    fn bounding_sphere(&self, points: &[Point3]) -> Result<BoundingSphere> {
        let Some(first) = points.first() else {
            return Err(GeometryError::EmptyPointCloud.into());
        };

        let mut center = first.coords;
        let mut radius = self.tolerance;

        for _ in 0..2 {
            for p in points {
                let len = (p.coords - center).norm();
                if len > radius {
                    let alpha = len / radius;
                    let alpha_sq = alpha * alpha;
                    radius = 0.5 * (alpha + 1.0 / alpha) * radius;
                    center = (center * (1.0 + 1.0 / alpha_sq) + p.coords * (1.0 - 1.0 / alpha_sq))
                        * 0.5;
                }
            }
        }

        for p in points {
            let diff = p.coords - center;
            let len = diff.norm();
            if len > radius {
                radius = (radius + len) / 2.0;
                center += diff * ((len - radius) / len);
            }
        }

        Ok(BoundingSphere {
            center: Point3::from(center),
            radius,
        })
    }
}

pub mod bounding_sphere;
pub mod spherical;

pub use bounding_sphere::{BoundingSphere, BoundingSphereOracle, RitterOracle};
pub use spherical::{cartesian_to_spherical, spherical_to_cartesian};

/// 3D point type. Colour samples live in the normalised `[0, 1]^3` cube.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns the unit vector pointing from `from` to `to` and the distance
/// between them, or `None` when the points coincide.
#[must_use]
pub fn direction_and_distance(from: &Point3, to: &Point3) -> Option<(Vector3, f64)> {
    let offset = to - from;
    let distance = offset.norm();
    if distance <= TOLERANCE {
        None
    } else {
        Some((offset / distance, distance))
    }
}

//! Spherical coordinates used by the shell grid.
//!
//! `phi` is the azimuth around the Z axis, measured from +Y towards +X.
//! `theta` is the elevation above the XY plane in `[-pi/2, pi/2]`.

use super::Vector3;

/// Converts a unit direction to `(phi, theta)`.
///
/// `phi` is returned in `(-pi, pi]`; callers wrap it as needed.
#[must_use]
pub fn cartesian_to_spherical(direction: &Vector3) -> (f64, f64) {
    let phi = direction.x.atan2(direction.y);
    let theta = direction.z.clamp(-1.0, 1.0).asin();
    (phi, theta)
}

/// Converts `(phi, theta)` to a unit direction.
#[must_use]
pub fn spherical_to_cartesian(phi: f64, theta: f64) -> Vector3 {
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vector3::new(sin_phi * cos_theta, cos_phi * cos_theta, sin_theta)
}

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::geometry::{ShellMesh, UnitShell};
use crate::math::{BoundingSphereOracle, Point3, Vector3};

/// Shell resolution and positioning parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellParams {
    /// Faces around the azimuth (must exceed 3).
    pub phi_faces: usize,
    /// Faces from pole to pole (must exceed 2).
    pub theta_faces: usize,
    /// Multiplier applied to the radius computed by
    /// [`ShellTemplate::position_around`].
    pub scale_multiplier: f64,
}

impl Default for ShellParams {
    fn default() -> Self {
        Self {
            phi_faces: 16,
            theta_faces: 8,
            scale_multiplier: 1.0,
        }
    }
}

impl ShellParams {
    /// Checks the numeric parameters.
    ///
    /// Face counts are validated when the grid is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] unless the multiplier is
    /// strictly positive.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        ConfigError::check_positive("scale_multiplier", self.scale_multiplier)
    }
}

/// An unpositioned bounding shell.
///
/// Owns a unit shell and a scale multiplier and stamps out any number of
/// [`BoundingShell`]s. A bounding shell has no way back to this state, so
/// fitting code that re-seats a shell asks its template for a fresh one.
#[derive(Debug, Clone)]
pub struct ShellTemplate {
    unit: UnitShell,
    scale_multiplier: f64,
}

impl ShellTemplate {
    /// Creates a template from shell parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the multiplier is not positive or the face counts
    /// are too small.
    pub fn new(params: &ShellParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            unit: UnitShell::new(params.phi_faces, params.theta_faces)?,
            scale_multiplier: params.scale_multiplier,
        })
    }

    /// Returns the scale multiplier.
    #[must_use]
    pub fn scale_multiplier(&self) -> f64 {
        self.scale_multiplier
    }

    /// Returns the number of vertices each shell will have.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.unit.vertex_count()
    }

    /// Places a spherical shell at `center` with the given radius.
    ///
    /// # Errors
    ///
    /// Returns an error if `radius` is not strictly positive.
    pub fn position(&self, center: Point3, radius: f64) -> Result<BoundingShell> {
        Ok(BoundingShell {
            template: self.clone(),
            mesh: self.unit.clone().position(center, radius)?,
        })
    }

    /// Places a shell centered on `desired_center` that encloses `points`.
    ///
    /// With the enclosing sphere `(c, r)` of `points`, the radius is
    /// `(r + |desired_center - c|) * scale_multiplier`, which covers the
    /// whole cloud even when it is off-center.
    ///
    /// # Errors
    ///
    /// Returns an error if `points` is empty or the resulting radius is
    /// not positive.
    pub fn position_around(
        &self,
        desired_center: Point3,
        points: &[Point3],
        oracle: &dyn BoundingSphereOracle,
    ) -> Result<BoundingShell> {
        let sphere = oracle.bounding_sphere(points)?;
        let radius =
            (sphere.radius + (desired_center - sphere.center).norm()) * self.scale_multiplier;
        debug!(
            points = points.len(),
            enclosing_radius = sphere.radius,
            radius,
            "positioning shell"
        );
        self.position(desired_center, radius)
    }
}

/// A positioned bounding shell.
#[derive(Debug, Clone)]
pub struct BoundingShell {
    template: ShellTemplate,
    mesh: ShellMesh,
}

impl BoundingShell {
    /// Returns the template this shell was positioned from.
    #[must_use]
    pub fn template(&self) -> &ShellTemplate {
        &self.template
    }

    /// Returns the underlying mesh.
    #[must_use]
    pub fn mesh(&self) -> &ShellMesh {
        &self.mesh
    }

    /// Returns the underlying mesh for radial vertex edits.
    pub fn mesh_mut(&mut self) -> &mut ShellMesh {
        &mut self.mesh
    }

    /// Returns the shell center.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        self.mesh.center()
    }

    /// See [`ShellMesh::find_distance`].
    ///
    /// # Errors
    ///
    /// Propagates errors from the mesh query.
    pub fn find_distance(&self, direction: &Vector3) -> Result<f64> {
        self.mesh.find_distance(direction)
    }

    /// See [`ShellMesh::count_inside`].
    ///
    /// # Errors
    ///
    /// Propagates errors from the mesh query.
    pub fn count_inside(&self, points: &[Point3]) -> Result<usize> {
        self.mesh.count_inside(points)
    }

    /// Returns a copy scaled about the center by `factor`.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            template: self.template.clone(),
            mesh: self.mesh.scaled(factor),
        }
    }

    /// Largest vertex-to-center distance.
    #[must_use]
    pub fn find_largest_radius(&self) -> f64 {
        self.mesh.largest_radius()
    }

    /// Smallest vertex-to-center distance.
    #[must_use]
    pub fn find_smallest_radius(&self) -> f64 {
        self.mesh.smallest_radius()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::MatteError;
    use crate::math::RitterOracle;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn template(multiplier: f64) -> ShellTemplate {
        ShellTemplate::new(&ShellParams {
            scale_multiplier: multiplier,
            ..ShellParams::default()
        })
        .unwrap()
    }

    #[test]
    fn non_positive_multiplier_fails() {
        for multiplier in [-1.0, 0.0] {
            let result = ShellTemplate::new(&ShellParams {
                scale_multiplier: multiplier,
                ..ShellParams::default()
            });
            assert!(matches!(
                result,
                Err(MatteError::Config(ConfigError::OutOfRange { .. }))
            ));
        }
    }

    #[test]
    fn position_around_encloses_off_center_cloud() {
        let points = [p(0.8, 0.8, 0.8), p(0.9, 0.7, 0.8), p(0.7, 0.9, 0.85)];
        let shell = template(1.0)
            .position_around(p(0.1, 0.1, 0.1), &points, &RitterOracle::default())
            .unwrap();
        assert_eq!(*shell.center(), p(0.1, 0.1, 0.1));
        // The cloud sits well inside the inscribed polyhedron at this resolution.
        assert_eq!(shell.count_inside(&points).unwrap(), points.len());
    }

    #[test]
    fn multiplier_scales_radius() {
        let points = [p(0.4, 0.5, 0.5), p(0.6, 0.5, 0.5)];
        let oracle = RitterOracle::default();
        let a = template(1.0).position_around(p(0.5, 0.5, 0.5), &points, &oracle).unwrap();
        let b = template(2.0).position_around(p(0.5, 0.5, 0.5), &points, &oracle).unwrap();
        assert_relative_eq!(
            b.find_largest_radius(),
            2.0 * a.find_largest_radius(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn empty_cloud_cannot_be_enclosed() {
        let result = template(1.0).position_around(p(0.5, 0.5, 0.5), &[], &RitterOracle::default());
        assert!(result.is_err());
    }

    #[test]
    fn scale_keeps_center_and_template() {
        let shell = template(1.0).position(p(0.5, 0.5, 0.5), 0.2).unwrap();
        let scaled = shell.scale(1.5);
        assert_eq!(scaled.center(), shell.center());
        assert_relative_eq!(scaled.find_largest_radius(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(scaled.find_smallest_radius(), 0.3, epsilon = 1e-12);
        assert_eq!(scaled.template().vertex_count(), shell.template().vertex_count());
    }
}

use std::sync::Arc;

use tracing::warn;

use crate::error::{GeometryError, Result};
use crate::math::{direction_and_distance, Point3, Vector3, TOLERANCE};

use super::ShellGrid;

/// Offset applied to a query direction before the single degenerate retry.
const RETRY_PERTURBATION: f64 = 1e-6;

/// A shell mesh that has not been placed in colour space yet.
///
/// This is a unit sphere approximation around the origin. The only way to
/// obtain a [`ShellMesh`] with a real center and radius is
/// [`position`](Self::position), which consumes the unit shell, so a mesh
/// can never be scaled and translated twice.
#[derive(Debug, Clone)]
pub struct UnitShell {
    mesh: ShellMesh,
}

impl UnitShell {
    /// Builds a unit shell with the given face counts.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] unless `phi_faces > 3`
    /// and `theta_faces > 2`.
    pub fn new(phi_faces: usize, theta_faces: usize) -> Result<Self> {
        let grid = Arc::new(ShellGrid::new(phi_faces, theta_faces)?);
        let radii = vec![1.0; grid.vertex_count()];
        Ok(Self {
            mesh: ShellMesh {
                grid,
                center: Point3::origin(),
                radius: 1.0,
                radii,
            },
        })
    }

    /// Returns the grid topology.
    #[must_use]
    pub fn grid(&self) -> &ShellGrid {
        &self.mesh.grid
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Distance from the origin to the unit shell along `direction`.
    ///
    /// # Errors
    ///
    /// See [`ShellMesh::find_distance`].
    pub fn find_distance(&self, direction: &Vector3) -> Result<f64> {
        self.mesh.find_distance(direction)
    }

    /// Scales the unit shell by `radius` and moves it to `center`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] if `radius` is not
    /// strictly positive.
    pub fn position(self, center: Point3, radius: f64) -> Result<ShellMesh> {
        if radius.is_nan() || radius <= TOLERANCE {
            return Err(GeometryError::InvalidParameter {
                parameter: "radius",
                value: radius,
                min: 0.0,
            }
            .into());
        }
        let mut mesh = self.mesh;
        mesh.center = center;
        mesh.radius = radius;
        mesh.radii.iter_mut().for_each(|r| *r = radius);
        Ok(mesh)
    }
}

/// A positioned polyhedral sphere approximation.
///
/// Every vertex is stored as a radius along a fixed unit direction taken
/// from the shared [`ShellGrid`]. Vertices can only slide along their own
/// ray, which keeps the O(1) triangle lookup in
/// [`find_distance`](Self::find_distance) valid under any fitting.
#[derive(Debug, Clone)]
pub struct ShellMesh {
    grid: Arc<ShellGrid>,
    center: Point3,
    radius: f64,
    radii: Vec<f64>,
}

impl ShellMesh {
    /// Returns the grid topology.
    #[must_use]
    pub fn grid(&self) -> &ShellGrid {
        &self.grid
    }

    /// Returns the center every vertex ray starts from.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius the mesh was positioned with.
    #[must_use]
    pub fn nominal_radius(&self) -> f64 {
        self.radius
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.radii.len()
    }

    /// Returns the distance of every vertex from the center.
    #[must_use]
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Returns the distance of vertex `index` from the center.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn vertex_radius(&self, index: usize) -> f64 {
        self.radii[index]
    }

    /// Moves vertex `index` along its ray to `radius` (clamped at zero).
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set_vertex_radius(&mut self, index: usize, radius: f64) {
        self.radii[index] = radius.max(0.0);
    }

    /// Returns the Cartesian position of vertex `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn vertex(&self, index: usize) -> Point3 {
        self.center + self.grid.directions()[index] * self.radii[index]
    }

    /// Iterates over the Cartesian vertex positions in storage order.
    pub fn vertices(&self) -> impl Iterator<Item = Point3> + '_ {
        self.grid
            .directions()
            .iter()
            .zip(&self.radii)
            .map(|(d, r)| self.center + d * *r)
    }

    /// Returns a copy with every vertex mapped to
    /// `(vertex - center) * factor + center`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = self.clone();
        out.radii.iter_mut().for_each(|r| *r = (*r * factor).max(0.0));
        out.radius *= factor;
        out
    }

    /// Largest vertex-to-center distance.
    #[must_use]
    pub fn largest_radius(&self) -> f64 {
        self.radii.iter().copied().fold(0.0, f64::max)
    }

    /// Smallest vertex-to-center distance.
    #[must_use]
    pub fn smallest_radius(&self) -> f64 {
        self.radii.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Distance from the center to the shell surface along `direction`.
    ///
    /// The direction does not need to be normalised. The crossed triangle is
    /// picked by [`ShellGrid::select_triangle`] and the distance is measured
    /// to that triangle's plane. A ray parallel to the plane is retried once
    /// with a slightly perturbed direction.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] for a zero direction and
    /// [`GeometryError::CoplanarRay`] if the retry is degenerate as well.
    pub fn find_distance(&self, direction: &Vector3) -> Result<f64> {
        let len = direction.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let direction = direction / len;

        if let Some(distance) = self.distance_along(&direction) {
            return Ok(distance);
        }

        warn!(?direction, "shell query ray is coplanar with its triangle, retrying");
        let perturbed = (direction
            + Vector3::new(RETRY_PERTURBATION, -RETRY_PERTURBATION, RETRY_PERTURBATION))
        .normalize();
        self.distance_along(&perturbed)
            .ok_or_else(|| GeometryError::CoplanarRay.into())
    }

    fn distance_along(&self, direction: &Vector3) -> Option<f64> {
        self.distance_to_triangle(self.grid.select_triangle(direction), direction)
    }

    /// Distance from the center to the plane of a known triangle along a
    /// unit `direction`, or `None` if the ray is parallel to it.
    pub(crate) fn distance_to_triangle(
        &self,
        [a, b, c]: [usize; 3],
        direction: &Vector3,
    ) -> Option<f64> {
        let v1 = self.vertex(a);
        let v2 = self.vertex(b);
        let v3 = self.vertex(c);

        let normal = (v2 - v1).cross(&(v3 - v1));
        let vn = direction.dot(&normal);
        // Also rejects collapsed triangles, whose normal is zero.
        if vn.abs() <= TOLERANCE * normal.norm() {
            return None;
        }
        Some((v1 - self.center).dot(&normal) / vn)
    }

    /// Returns `true` if `point` lies inside or on the shell.
    ///
    /// The center itself is always inside.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`find_distance`](Self::find_distance).
    pub fn contains(&self, point: &Point3) -> Result<bool> {
        match direction_and_distance(&self.center, point) {
            None => Ok(true),
            Some((direction, distance)) => Ok(distance <= self.find_distance(&direction)?),
        }
    }

    /// Counts the points of `points` that lie inside or on the shell.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`find_distance`](Self::find_distance).
    pub fn count_inside(&self, points: &[Point3]) -> Result<usize> {
        let mut count = 0;
        for p in points {
            if self.contains(p)? {
                count += 1;
            }
        }
        Ok(count)
    }
}

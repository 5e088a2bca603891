use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::error::{GeometryError, Result};
use crate::math::{cartesian_to_spherical, spherical_to_cartesian, Vector3};

/// UV-sphere topology shared by every shell built from the same parameters.
///
/// Grid vertices are stored row-major by phi: the vertex at azimuth step
/// `i_phi` and elevation row `i_theta` lives at `i_phi * rows + i_theta`,
/// where `rows = theta_faces - 1`. The north and south poles follow the grid
/// as the last two entries. Neighbours are found by index arithmetic alone,
/// which is what makes [`select_triangle`](Self::select_triangle) O(1).
#[derive(Debug, Clone)]
pub struct ShellGrid {
    phi_faces: usize,
    theta_faces: usize,
    phi_angle: f64,
    theta_angle: f64,
    directions: Vec<Vector3>,
}

impl ShellGrid {
    /// Builds the unit directions for a grid with the given face counts.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] unless `phi_faces > 3`
    /// and `theta_faces > 2`.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(phi_faces: usize, theta_faces: usize) -> Result<Self> {
        if phi_faces <= 3 {
            return Err(GeometryError::InvalidParameter {
                parameter: "phi_faces",
                value: phi_faces as f64,
                min: 3.0,
            }
            .into());
        }
        if theta_faces <= 2 {
            return Err(GeometryError::InvalidParameter {
                parameter: "theta_faces",
                value: theta_faces as f64,
                min: 2.0,
            }
            .into());
        }

        let phi_angle = TAU / phi_faces as f64;
        let theta_angle = PI / theta_faces as f64;

        let mut directions = Vec::with_capacity(phi_faces * (theta_faces - 1) + 2);
        for i_phi in 0..phi_faces {
            for j in 1..theta_faces {
                directions.push(spherical_to_cartesian(
                    i_phi as f64 * phi_angle,
                    j as f64 * theta_angle - FRAC_PI_2,
                ));
            }
        }
        directions.push(Vector3::z());
        directions.push(-Vector3::z());

        Ok(Self {
            phi_faces,
            theta_faces,
            phi_angle,
            theta_angle,
            directions,
        })
    }

    /// Number of faces around the azimuth.
    #[must_use]
    pub fn phi_faces(&self) -> usize {
        self.phi_faces
    }

    /// Number of faces from pole to pole.
    #[must_use]
    pub fn theta_faces(&self) -> usize {
        self.theta_faces
    }

    /// Number of vertices: `phi_faces * (theta_faces - 1) + 2`.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.directions.len()
    }

    /// Unit direction of every vertex, in storage order.
    #[must_use]
    pub fn directions(&self) -> &[Vector3] {
        &self.directions
    }

    /// Index of the north pole vertex.
    #[must_use]
    pub fn north_pole(&self) -> usize {
        self.directions.len() - 2
    }

    /// Index of the south pole vertex.
    #[must_use]
    pub fn south_pole(&self) -> usize {
        self.directions.len() - 1
    }

    fn rows(&self) -> usize {
        self.theta_faces - 1
    }

    fn index(&self, i_phi: usize, i_theta: usize) -> usize {
        (i_phi % self.phi_faces) * self.rows() + i_theta
    }

    /// Returns the vertex indices of the triangle crossed by a ray from the
    /// center along `direction` (a unit vector).
    ///
    /// The azimuth picks the column exactly, since column edges lie in
    /// meridian planes. The elevation gives a first guess at the band (south
    /// fan, a quad row, or north fan), which is then corrected against the
    /// chord planes of the bounding rows: a chord between two vertices of a
    /// row bulges poleward of their latitude. Inside a quad the side of the
    /// diagonal plane picks the half. The result depends on `direction` only,
    /// and the ray always lies inside the cone of the returned triangle.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn select_triangle(&self, direction: &Vector3) -> [usize; 3] {
        let (phi, theta) = cartesian_to_spherical(direction);
        let phi = phi.rem_euclid(TAU);
        let theta_offset = theta + FRAC_PI_2;

        let i_phi = ((phi / self.phi_angle) as usize).min(self.phi_faces - 1);
        let next_phi = i_phi + 1;
        let top_band = self.theta_faces - 1;

        let mut band = ((theta_offset / self.theta_angle) as usize).min(top_band);
        for _ in 0..self.theta_faces {
            if band < top_band && self.north_of_row(direction, i_phi, band) {
                band += 1;
            } else if band > 0 && !self.north_of_row(direction, i_phi, band - 1) {
                band -= 1;
            } else {
                break;
            }
        }

        if band == 0 {
            return [
                self.index(i_phi, 0),
                self.index(next_phi, 0),
                self.south_pole(),
            ];
        }
        if band == top_band {
            let top_row = self.rows() - 1;
            return [
                self.index(i_phi, top_row),
                self.index(next_phi, top_row),
                self.north_pole(),
            ];
        }

        let (upper, lower) = (band, band - 1);
        let shared_a = self.index(next_phi, upper);
        let shared_b = self.index(i_phi, lower);
        let upper_left = self.index(i_phi, upper);
        let diagonal = self.directions[shared_a].cross(&self.directions[shared_b]);
        let side = direction.dot(&diagonal);
        if side * self.directions[upper_left].dot(&diagonal) > 0.0 {
            [shared_a, shared_b, upper_left]
        } else {
            [shared_a, shared_b, self.index(next_phi, lower)]
        }
    }

    /// Whether `direction` lies strictly on the north side of the plane
    /// through the center and the chord of `row` in column `i_phi`.
    fn north_of_row(&self, direction: &Vector3, i_phi: usize, row: usize) -> bool {
        let normal = self.directions[self.index(i_phi, row)]
            .cross(&self.directions[self.index(i_phi + 1, row)]);
        direction.dot(&normal) * normal.z > 0.0
    }

    /// Enumerates every triangle the query can select, quads first, then
    /// the north and south fans.
    #[must_use]
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let top_row = self.rows() - 1;
        let mut triangles = Vec::with_capacity(2 * self.phi_faces * (self.theta_faces - 1));

        for i_phi in 0..self.phi_faces {
            let next_phi = i_phi + 1;
            for upper in 1..=top_row {
                let lower = upper - 1;
                let shared_a = self.index(next_phi, upper);
                let shared_b = self.index(i_phi, lower);
                triangles.push([shared_a, shared_b, self.index(i_phi, upper)]);
                triangles.push([shared_a, shared_b, self.index(next_phi, lower)]);
            }
        }
        for i_phi in 0..self.phi_faces {
            triangles.push([
                self.index(i_phi, top_row),
                self.index(i_phi + 1, top_row),
                self.north_pole(),
            ]);
        }
        for i_phi in 0..self.phi_faces {
            triangles.push([
                self.index(i_phi, 0),
                self.index(i_phi + 1, 0),
                self.south_pole(),
            ]);
        }
        triangles
    }
}

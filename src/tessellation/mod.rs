use crate::geometry::ShellMesh;
use crate::math::{Point3, Vector3, TOLERANCE};

/// A triangle mesh approximation of a shell.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices, wound counter-clockwise seen from outside.
    pub indices: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }
}

/// Converts a shell mesh into the triangles its distance query uses.
pub struct TessellateShell<'a> {
    mesh: &'a ShellMesh,
}

impl<'a> TessellateShell<'a> {
    /// Creates a new `TessellateShell` operation.
    #[must_use]
    pub fn new(mesh: &'a ShellMesh) -> Self {
        Self { mesh }
    }

    /// Executes the tessellation.
    ///
    /// Vertex normals average the adjacent face normals; a vertex whose
    /// faces have all collapsed falls back to its ray direction.
    #[must_use]
    pub fn execute(&self) -> TriangleMesh {
        let vertices: Vec<Point3> = self.mesh.vertices().collect();
        let center = self.mesh.center();
        let mut normals = vec![Vector3::zeros(); vertices.len()];
        let mut indices = Vec::new();

        for [a, b, c] in self.mesh.grid().triangles() {
            let face_normal = (vertices[b] - vertices[a]).cross(&(vertices[c] - vertices[a]));
            let centroid = Point3::from(
                (vertices[a].coords + vertices[b].coords + vertices[c].coords) / 3.0,
            );
            let (tri, face_normal) = if face_normal.dot(&(centroid - center)) < 0.0 {
                ([a, c, b], -face_normal)
            } else {
                ([a, b, c], face_normal)
            };
            for &v in &tri {
                normals[v] += face_normal;
            }
            indices.push(tri);
        }

        for (normal, direction) in normals.iter_mut().zip(self.mesh.grid().directions()) {
            let len = normal.norm();
            *normal = if len < TOLERANCE {
                *direction
            } else {
                *normal / len
            };
        }

        TriangleMesh {
            vertices,
            normals,
            indices,
        }
    }
}

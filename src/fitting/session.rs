use crate::error::Result;
use crate::geometry::ShellMesh;
use crate::math::{direction_and_distance, Point3, Vector3};

/// A cloud point seen from the shell center.
#[derive(Debug, Clone)]
struct Sample {
    triangle: [usize; 3],
    direction: Vector3,
    distance: f64,
}

/// Inside/outside bookkeeping for one shrink or expand call.
///
/// Radial moves never change which triangle a point's ray crosses, so each
/// point is bound to its triangle once and only the points touching a moved
/// vertex are re-classified.
#[derive(Debug)]
pub(super) struct FittingSession {
    samples: Vec<Sample>,
    by_vertex: Vec<Vec<usize>>,
    inside: Vec<bool>,
    at_center: usize,
    inside_count: usize,
}

/// Re-classification of the samples around one vertex, not yet committed.
#[derive(Debug)]
pub(super) struct Evaluation {
    count: usize,
    updates: Vec<(usize, bool)>,
}

impl FittingSession {
    pub(super) fn new(mesh: &ShellMesh, points: &[Point3]) -> Result<Self> {
        let mut samples = Vec::with_capacity(points.len());
        let mut by_vertex = vec![Vec::new(); mesh.vertex_count()];
        let mut at_center = 0;

        for point in points {
            let Some((direction, distance)) = direction_and_distance(mesh.center(), point) else {
                at_center += 1;
                continue;
            };
            let triangle = mesh.grid().select_triangle(&direction);
            for &v in &triangle {
                by_vertex[v].push(samples.len());
            }
            samples.push(Sample {
                triangle,
                direction,
                distance,
            });
        }

        let mut session = Self {
            inside: vec![false; samples.len()],
            samples,
            by_vertex,
            at_center,
            inside_count: at_center,
        };
        for i in 0..session.samples.len() {
            if session.classify(mesh, i)? {
                session.inside[i] = true;
                session.inside_count += 1;
            }
        }
        Ok(session)
    }

    /// Number of points currently inside the shell.
    pub(super) fn inside_count(&self) -> usize {
        self.inside_count
    }

    /// Number of points tracked, including any at the center.
    pub(super) fn len(&self) -> usize {
        self.samples.len() + self.at_center
    }

    fn classify(&self, mesh: &ShellMesh, index: usize) -> Result<bool> {
        let sample = &self.samples[index];
        let shell_distance = match mesh.distance_to_triangle(sample.triangle, &sample.direction) {
            Some(d) => d,
            None => mesh.find_distance(&sample.direction)?,
        };
        Ok(sample.distance <= shell_distance)
    }

    /// Re-classifies the points whose triangle uses `vertex`.
    pub(super) fn evaluate(&self, mesh: &ShellMesh, vertex: usize) -> Result<Evaluation> {
        let mut count = self.inside_count;
        let mut updates = Vec::new();
        for &i in &self.by_vertex[vertex] {
            let now = self.classify(mesh, i)?;
            if now != self.inside[i] {
                if now {
                    count += 1;
                } else {
                    count -= 1;
                }
                updates.push((i, now));
            }
        }
        Ok(Evaluation { count, updates })
    }

    /// Whether committing `evaluation` would leave fewer points inside than
    /// the shell holds right now.
    pub(super) fn releases(&self, evaluation: &Evaluation) -> bool {
        evaluation.count < self.inside_count
    }

    /// Whether committing `evaluation` would take in a point that is
    /// currently outside.
    pub(super) fn swallows(&self, evaluation: &Evaluation) -> bool {
        evaluation.count > self.inside_count
    }

    pub(super) fn commit(&mut self, evaluation: Evaluation) {
        for (i, now) in evaluation.updates {
            self.inside[i] = now;
        }
        self.inside_count = evaluation.count;
    }
}

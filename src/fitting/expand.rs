use tracing::{debug, warn};

use crate::error::Result;
use crate::math::{BoundingSphereOracle, Point3};
use crate::segmentation::SegmenterResult;
use crate::shell::BoundingShell;

use super::session::FittingSession;
use super::{expired, FitReport, RadialFitter};

/// Final radii of an expansion and which vertices pushed against the cloud.
struct Expansion {
    radii: Vec<f64>,
    resisted: Vec<bool>,
}

impl Expansion {
    /// Moves every unresisted vertex to the mean displacement of the
    /// resisted ones. With no resisted vertex the radii are kept.
    fn settle(mut self, initial: &[f64]) -> Vec<f64> {
        let (sum, count) = self
            .radii
            .iter()
            .zip(initial)
            .zip(&self.resisted)
            .filter(|(_, &resisted)| resisted)
            .fold((0.0, 0_u32), |(sum, count), ((r, r0), _)| (sum + (r - r0), count + 1));

        if count > 0 {
            let mean = sum / f64::from(count);
            for ((r, r0), _) in self
                .radii
                .iter_mut()
                .zip(initial)
                .zip(&self.resisted)
                .filter(|(_, &resisted)| !resisted)
            {
                *r = r0 + mean;
            }
        }
        self.radii
    }
}

pub(super) fn run<O: BoundingSphereOracle>(
    fitter: &RadialFitter<O>,
    shell: &mut BoundingShell,
    split: &SegmenterResult,
    background: &Point3,
    start_radius: f64,
    end_radius: f64,
) -> Result<FitReport> {
    let deadline = fitter.deadline();
    let template = shell.template().clone();

    let mut seated = if split.inner.is_empty() {
        template.position(*background, start_radius)?
    } else {
        template.position_around(*background, &split.inner, &fitter.oracle)?
    };
    if seated.mesh().nominal_radius() < start_radius {
        seated = template.position(*background, start_radius)?;
    }

    let initial = seated.mesh().radii().to_vec();
    let mut scratch = seated.mesh().clone();
    let mut session = FittingSession::new(&scratch, &split.outer)?;
    let baseline = session.len() - session.inside_count();
    let mut report = FitReport {
        baseline,
        ..FitReport::default()
    };

    let mut resisted = vec![false; scratch.vertex_count()];
    let mut step = (end_radius - start_radius).max(0.0) / 2.0;

    for pass in 0..fitter.params.iterations {
        if expired(deadline) {
            warn!(pass, "expand time budget exhausted");
            report.timed_out = true;
            break;
        }

        let mut accepted = 0;
        for vertex in 0..scratch.vertex_count() {
            let radius = scratch.vertex_radius(vertex);
            scratch.set_vertex_radius(vertex, radius + step);
            let evaluation = session.evaluate(&scratch, vertex)?;
            if session.swallows(&evaluation) {
                scratch.set_vertex_radius(vertex, radius);
                resisted[vertex] = true;
                report.reverted += 1;
            } else {
                session.commit(evaluation);
                accepted += 1;
            }
        }

        debug!(
            pass,
            step,
            accepted,
            outside = session.len() - session.inside_count(),
            "expand pass"
        );
        report.accepted += accepted;
        report.passes += 1;
        step /= 2.0;
    }

    let radii = Expansion {
        radii: scratch.radii().to_vec(),
        resisted,
    }
    .settle(&initial);

    let mesh = seated.mesh_mut();
    for (vertex, radius) in radii.into_iter().enumerate() {
        mesh.set_vertex_radius(vertex, radius);
    }
    report.final_count = split.outer.len() - mesh.count_inside(&split.outer)?;
    *shell = seated;
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fitting::{FittingParams, ShellFitter};
    use crate::segmentation::DistanceSegmenter;
    use crate::shell::{ShellParams, ShellTemplate};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn template() -> ShellTemplate {
        ShellTemplate::new(&ShellParams::default()).unwrap()
    }

    #[test]
    fn settle_averages_resisted_displacement() {
        let initial = [1.0, 1.0, 1.0, 1.0];
        let expansion = Expansion {
            radii: vec![1.2, 1.4, 2.0, 2.0],
            resisted: vec![true, true, false, false],
        };
        let radii = expansion.settle(&initial);
        assert!((radii[0] - 1.2).abs() < 1e-12);
        assert!((radii[1] - 1.4).abs() < 1e-12);
        assert!((radii[2] - 1.3).abs() < 1e-12);
        assert!((radii[3] - 1.3).abs() < 1e-12);
    }

    #[test]
    fn settle_without_resistance_keeps_radii() {
        let expansion = Expansion {
            radii: vec![1.5, 1.5],
            resisted: vec![false, false],
        };
        assert_eq!(expansion.settle(&[1.0, 1.0]), vec![1.5, 1.5]);
    }

    #[test]
    fn unobstructed_expansion_approaches_end_radius() {
        let background = p(0.5, 0.5, 0.5);
        let points = [p(0.52, 0.5, 0.5), p(0.5, 0.48, 0.5)];
        let mut shell = template().position(background, 0.1).unwrap();

        let report = RadialFitter::new(FittingParams::default())
            .expand(&mut shell, &points, &DistanceSegmenter, &background, 0.1, 0.3)
            .unwrap();

        assert_eq!(report.reverted, 0);
        let expected = 0.1 + 0.2 * (1.0 - 0.5_f64.powi(8));
        assert!((shell.find_smallest_radius() - expected).abs() < 1e-9);
        assert!((shell.find_largest_radius() - expected).abs() < 1e-9);
    }

    #[test]
    fn never_crosses_outer_points() {
        let background = p(0.2, 0.2, 0.2);
        let mut points = vec![p(0.22, 0.2, 0.2), p(0.2, 0.21, 0.2)];
        let blockers = [
            p(0.45, 0.2, 0.2),
            p(0.2, 0.2, 0.5),
            p(0.0, 0.05, 0.2),
            p(0.35, 0.35, 0.35),
        ];
        points.extend_from_slice(&blockers);
        let mut shell = template().position(background, 0.1).unwrap();

        let report = RadialFitter::new(FittingParams::default())
            .expand(&mut shell, &points, &DistanceSegmenter, &background, 0.15, 0.6)
            .unwrap();

        assert_eq!(report.baseline, blockers.len());
        assert_eq!(report.final_count, blockers.len());
        assert_eq!(shell.count_inside(&blockers).unwrap(), 0);
        assert!(report.reverted > 0);
        assert!(shell.find_smallest_radius() >= 0.15 - 1e-12);
    }

    #[test]
    fn starts_no_smaller_than_start_radius() {
        let background = p(0.5, 0.5, 0.5);
        let points = [p(0.9, 0.9, 0.9)];
        let mut shell = template().position(background, 0.05).unwrap();

        RadialFitter::new(FittingParams {
            iterations: 0,
            ..FittingParams::default()
        })
        .expand(&mut shell, &points, &DistanceSegmenter, &background, 0.2, 0.4)
        .unwrap();

        assert!((shell.find_smallest_radius() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn empty_cloud_is_a_no_op() {
        let mut shell = template().position(p(0.5, 0.5, 0.5), 0.1).unwrap();
        let report = RadialFitter::new(FittingParams::default())
            .expand(&mut shell, &[], &DistanceSegmenter, &p(0.0, 0.0, 0.0), 0.2, 0.4)
            .unwrap();
        assert_eq!(report, FitReport::default());
        assert!((shell.find_largest_radius() - 0.1).abs() < 1e-12);
    }
}

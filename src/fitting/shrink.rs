use tracing::{debug, warn};

use crate::error::Result;
use crate::math::{BoundingSphereOracle, Point3};
use crate::shell::BoundingShell;

use super::session::FittingSession;
use super::{expired, FitReport, RadialFitter};

pub(super) fn run<O: BoundingSphereOracle>(
    fitter: &RadialFitter<O>,
    shell: &mut BoundingShell,
    points: &[Point3],
    background: &Point3,
    minimum_distance: f64,
) -> Result<FitReport> {
    let deadline = fitter.deadline();
    *shell = shell
        .template()
        .position_around(*background, points, &fitter.oracle)?;

    let mut session = FittingSession::new(shell.mesh(), points)?;
    let baseline = session.inside_count();
    let mut report = FitReport {
        baseline,
        ..FitReport::default()
    };

    let mesh = shell.mesh_mut();
    let mut step = mesh.nominal_radius() / 2.0;

    for pass in 0..fitter.params.iterations {
        if expired(deadline) {
            warn!(pass, "shrink time budget exhausted");
            report.timed_out = true;
            break;
        }

        let mut accepted = 0;
        for vertex in 0..mesh.vertex_count() {
            let radius = mesh.vertex_radius(vertex);
            // Keep vertices off the center and out of the no-go zone.
            if radius < minimum_distance || radius <= step {
                continue;
            }

            mesh.set_vertex_radius(vertex, radius - step);
            let evaluation = session.evaluate(mesh, vertex)?;
            if session.releases(&evaluation) {
                mesh.set_vertex_radius(vertex, radius);
                report.reverted += 1;
            } else {
                session.commit(evaluation);
                accepted += 1;
            }
        }

        debug!(pass, step, accepted, inside = session.inside_count(), "shrink pass");
        report.accepted += accepted;
        report.passes += 1;
        step /= 2.0;
    }

    report.final_count = session.inside_count();
    Ok(report)
}

//! Iterative radial fitting of bounding shells against point clouds.
//!
//! Both operations move vertices only along their own rays and halve the
//! step after every pass. Each pass keeps its containment invariant, so a
//! pass cut short by [`FittingParams::time_budget`] still leaves a valid
//! (if looser) shell.

mod expand;
mod session;
mod shrink;

use std::time::{Duration, Instant};

use crate::error::Result;
use crate::math::{BoundingSphereOracle, Point3, RitterOracle};
use crate::segmentation::ColourSegmenter;
use crate::shell::BoundingShell;

/// Parameters shared by shrink and expand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittingParams {
    /// Number of passes over all vertices.
    pub iterations: usize,
    /// Optional wall-clock budget, checked between passes.
    pub time_budget: Option<Duration>,
}

impl Default for FittingParams {
    fn default() -> Self {
        Self {
            iterations: 8,
            time_budget: None,
        }
    }
}

/// Summary of one shrink or expand call.
///
/// For shrink the tracked count is the number of cloud points inside the
/// shell; for expand it is the number of outer-subset points outside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitReport {
    /// Passes completed.
    pub passes: usize,
    /// Vertex moves kept.
    pub accepted: usize,
    /// Vertex moves undone because they broke the invariant.
    pub reverted: usize,
    /// Tracked count right after positioning.
    pub baseline: usize,
    /// Tracked count when the call returned.
    pub final_count: usize,
    /// Whether the time budget cut the passes short.
    pub timed_out: bool,
}

/// Shrink and expand operations for bounding shells.
pub trait ShellFitter {
    /// Re-seats `shell` around `background` and `points`, then pulls its
    /// vertices inward without ever releasing a point that was inside.
    ///
    /// Vertices closer to the center than `minimum_distance` are left alone.
    /// An empty cloud leaves the shell untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if positioning or a shell query fails.
    fn shrink(
        &self,
        shell: &mut BoundingShell,
        points: &[Point3],
        background: &Point3,
        minimum_distance: f64,
    ) -> Result<FitReport>;

    /// Re-seats `shell` around the points within `start_radius` of
    /// `background`, then pushes its vertices outward towards `end_radius`
    /// without crossing any point beyond `start_radius`.
    ///
    /// An empty cloud leaves the shell untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if positioning or a shell query fails.
    fn expand(
        &self,
        shell: &mut BoundingShell,
        points: &[Point3],
        segmenter: &dyn ColourSegmenter,
        background: &Point3,
        start_radius: f64,
        end_radius: f64,
    ) -> Result<FitReport>;
}

/// Step-halving radial fitter.
#[derive(Debug, Clone, Default)]
pub struct RadialFitter<O = RitterOracle> {
    params: FittingParams,
    oracle: O,
}

impl RadialFitter {
    /// Creates a fitter using the default [`RitterOracle`].
    #[must_use]
    pub fn new(params: FittingParams) -> Self {
        Self {
            params,
            oracle: RitterOracle::default(),
        }
    }
}

impl<O: BoundingSphereOracle> RadialFitter<O> {
    /// Creates a fitter with a custom bounding-sphere oracle.
    #[must_use]
    pub fn with_oracle(params: FittingParams, oracle: O) -> Self {
        Self { params, oracle }
    }

    /// Returns the fitting parameters.
    #[must_use]
    pub fn params(&self) -> &FittingParams {
        &self.params
    }

    fn deadline(&self) -> Option<Instant> {
        self.params
            .time_budget
            .and_then(|budget| Instant::now().checked_add(budget))
    }
}

impl<O: BoundingSphereOracle> ShellFitter for RadialFitter<O> {
    fn shrink(
        &self,
        shell: &mut BoundingShell,
        points: &[Point3],
        background: &Point3,
        minimum_distance: f64,
    ) -> Result<FitReport> {
        if points.is_empty() {
            return Ok(FitReport::default());
        }
        shrink::run(self, shell, points, background, minimum_distance)
    }

    fn expand(
        &self,
        shell: &mut BoundingShell,
        points: &[Point3],
        segmenter: &dyn ColourSegmenter,
        background: &Point3,
        start_radius: f64,
        end_radius: f64,
    ) -> Result<FitReport> {
        if points.is_empty() {
            return Ok(FitReport::default());
        }
        let split = segmenter.segment(points, background, start_radius);
        expand::run(self, shell, &split, background, start_radius, end_radius)
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

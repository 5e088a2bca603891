mod params;

pub use params::{FitSource, MatteParams};

use std::borrow::Cow;

use tracing::{info, warn};

use crate::alpha::{AlphaLocator, NestedShells, ShellAlphaLocator};
use crate::background::BackgroundColourLocator;
use crate::error::{ConfigError, InputError, Result, StateError};
use crate::fitting::{FitReport, RadialFitter, ShellFitter};
use crate::math::{Point3, RitterOracle, TOLERANCE};
use crate::segmentation::{ColourSegmenter, DistanceSegmenter};
use crate::shell::{BoundingShell, ShellTemplate};

/// Seed radius for an inner shell with nothing to shrink around.
const SEED_RADIUS: f64 = 1e-3;

/// Colour data for one matte: already cleaned and normalised to `[0, 1]^3`.
#[derive(Debug, Clone, Copy)]
pub struct MatteInput<'a> {
    /// Colours known to belong to the subject.
    pub foreground: &'a [Point3],
    /// Colours known to belong to the backdrop.
    pub background: &'a [Point3],
    /// The dominant backdrop colour every ray starts from.
    pub reference: Point3,
}

impl<'a> MatteInput<'a> {
    /// Creates an input with an explicit reference colour.
    #[must_use]
    pub fn new(foreground: &'a [Point3], background: &'a [Point3], reference: Point3) -> Self {
        Self {
            foreground,
            background,
            reference,
        }
    }

    /// Creates an input whose reference colour is estimated from the
    /// background cloud.
    ///
    /// # Errors
    ///
    /// Returns an error if the locator cannot find a colour, e.g. because
    /// the background cloud is empty.
    pub fn with_estimated_reference(
        foreground: &'a [Point3],
        background: &'a [Point3],
        locator: &dyn BackgroundColourLocator,
    ) -> Result<Self> {
        Ok(Self::new(
            foreground,
            background,
            locator.find_colour(background)?,
        ))
    }
}

/// Pluggable sub-algorithms. Every field must be filled in.
#[derive(Default)]
pub struct MatteComponents {
    /// Partitions clouds by distance from the reference.
    pub segmenter: Option<Box<dyn ColourSegmenter + Send + Sync>>,
    /// Shrinks and expands shells.
    pub fitter: Option<Box<dyn ShellFitter + Send + Sync>>,
    /// Turns fitted shells into alpha.
    pub alpha_locator: Option<Box<dyn AlphaLocator + Send + Sync>>,
}

impl MatteComponents {
    /// The distance segmenter, radial fitter and shell alpha locator,
    /// configured from `params`.
    ///
    /// # Errors
    ///
    /// Returns an error if the alpha band split is invalid.
    pub fn standard(params: &MatteParams) -> Result<Self> {
        Ok(Self {
            segmenter: Some(Box::new(DistanceSegmenter)),
            fitter: Some(Box::new(RadialFitter::with_oracle(
                params.fitting,
                RitterOracle::new(params.oracle_tolerance),
            ))),
            alpha_locator: Some(Box::new(ShellAlphaLocator::new(params.bands)?)),
        })
    }
}

/// Fit statistics from one [`MatteEngine::analyse`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Inner shell shrink.
    pub inner: FitReport,
    /// Outer shell expansion.
    pub outer: FitReport,
    /// Outer vertices pushed back out to meet the inner shell.
    pub clamped_vertices: usize,
}

/// Alpha values laid out on the caller's sample grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaMatte {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl AlphaMatte {
    /// Width of the grid.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major alpha values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Alpha at column `x`, row `y`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            self.values.get(y * self.width + x).copied()
        } else {
            None
        }
    }

    /// Consumes the matte, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// Fits nested shells to a foreground/background pair and computes alpha.
///
/// A new engine has validated parameters but no shells. [`analyse`](Self::analyse)
/// shrinks the inner shell around the background, expands the outer shell
/// towards the foreground and optionally derives a middle shell. Alpha can
/// only be queried after that.
pub struct MatteEngine<'a> {
    input: MatteInput<'a>,
    params: MatteParams,
    template: ShellTemplate,
    segmenter: Box<dyn ColourSegmenter + Send + Sync>,
    fitter: Box<dyn ShellFitter + Send + Sync>,
    alpha_locator: Box<dyn AlphaLocator + Send + Sync>,
    shells: Option<NestedShells>,
}

impl std::fmt::Debug for MatteEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatteEngine")
            .field("params", &self.params)
            .field("reference", &self.input.reference)
            .field("analysed", &self.is_analysed())
            .finish_non_exhaustive()
    }
}

impl<'a> MatteEngine<'a> {
    /// Wires up the components and validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingComponent`] if a component is absent,
    /// or a configuration/geometry error for invalid parameters.
    pub fn new(
        components: MatteComponents,
        params: MatteParams,
        input: MatteInput<'a>,
    ) -> Result<Self> {
        params.validate()?;
        let segmenter = components
            .segmenter
            .ok_or(ConfigError::MissingComponent("segmenter"))?;
        let fitter = components
            .fitter
            .ok_or(ConfigError::MissingComponent("fitter"))?;
        let alpha_locator = components
            .alpha_locator
            .ok_or(ConfigError::MissingComponent("alpha_locator"))?;

        Ok(Self {
            input,
            params,
            template: ShellTemplate::new(&params.shell)?,
            segmenter,
            fitter,
            alpha_locator,
            shells: None,
        })
    }

    /// Builds an engine from the standard components.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` is invalid.
    pub fn with_params(params: MatteParams, input: MatteInput<'a>) -> Result<Self> {
        Self::new(MatteComponents::standard(&params)?, params, input)
    }

    /// Returns the parameters.
    #[must_use]
    pub fn params(&self) -> &MatteParams {
        &self.params
    }

    /// Returns the input.
    #[must_use]
    pub fn input(&self) -> &MatteInput<'a> {
        &self.input
    }

    /// Whether [`analyse`](Self::analyse) has completed.
    #[must_use]
    pub fn is_analysed(&self) -> bool {
        self.shells.is_some()
    }

    /// Returns the fitted shells once analysed.
    #[must_use]
    pub fn shells(&self) -> Option<&NestedShells> {
        self.shells.as_ref()
    }

    fn cloud(&self, source: FitSource) -> Cow<'a, [Point3]> {
        match source {
            FitSource::Background => Cow::Borrowed(self.input.background),
            FitSource::Foreground => Cow::Borrowed(self.input.foreground),
            FitSource::Combined => {
                Cow::Owned([self.input.background, self.input.foreground].concat())
            }
        }
    }

    /// Fits the shells. May be called again to refit from scratch.
    ///
    /// # Errors
    ///
    /// Returns an error if positioning or fitting fails.
    pub fn analyse(&mut self) -> Result<AnalysisReport> {
        let reference = self.input.reference;
        let mut report = AnalysisReport::default();

        let inner_cloud = self.cloud(self.params.inner_source);
        if inner_cloud.is_empty() {
            warn!("inner shell cloud is empty, keeping seed shell");
        }
        let seed = self.params.inner_min_distance.max(SEED_RADIUS);
        let mut inner = self.template.position(reference, seed)?;
        report.inner = self.fitter.shrink(
            &mut inner,
            &inner_cloud,
            &reference,
            self.params.inner_min_distance,
        )?;
        if (self.params.inner_scale - 1.0).abs() > TOLERANCE {
            inner = inner.scale(self.params.inner_scale);
        }
        info!(
            smallest = inner.find_smallest_radius(),
            largest = inner.find_largest_radius(),
            "inner shell fitted"
        );

        let start_radius = inner.find_largest_radius().max(SEED_RADIUS);
        let end_radius = start_radius + self.params.expand_delta;
        let outer_cloud = self.cloud(self.params.outer_source);
        let mut outer = self.template.position(reference, start_radius)?;
        report.outer = self.fitter.expand(
            &mut outer,
            &outer_cloud,
            self.segmenter.as_ref(),
            &reference,
            start_radius,
            end_radius,
        )?;

        report.clamped_vertices = clamp_outside(&inner, &mut outer);
        if report.clamped_vertices > 0 {
            warn!(
                vertices = report.clamped_vertices,
                "outer shell crossed the inner shell and was clamped"
            );
        }
        let outer = place_between(&inner, &outer, self.params.outer_rescale_fraction);
        info!(
            smallest = outer.find_smallest_radius(),
            largest = outer.find_largest_radius(),
            "outer shell fitted"
        );

        let shells = match self.params.middle_fraction {
            Some(fraction) => {
                let middle = place_between(&inner, &outer, fraction);
                NestedShells::with_middle(inner, middle, outer)
            }
            None => NestedShells::new(inner, outer),
        };
        self.shells = Some(shells);
        Ok(report)
    }

    /// Alpha for each sample, in sample order.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotAnalysed`] before [`analyse`](Self::analyse),
    /// or an error from the alpha locator.
    pub fn find_alphas(&self, samples: &[Point3]) -> Result<Vec<f32>> {
        let shells = self.shells.as_ref().ok_or(StateError::NotAnalysed)?;
        self.alpha_locator
            .find_alphas(shells, samples, &self.input.reference)
    }

    /// Alpha for a row-major `width * height` grid of samples.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::LengthMismatch`] if the sample count does not
    /// match the grid, plus any error from [`find_alphas`](Self::find_alphas).
    pub fn find_matte(
        &self,
        samples: &[Point3],
        width: usize,
        height: usize,
    ) -> Result<AlphaMatte> {
        let expected = width * height;
        if samples.len() != expected {
            return Err(InputError::LengthMismatch {
                expected,
                actual: samples.len(),
            }
            .into());
        }
        Ok(AlphaMatte {
            width,
            height,
            values: self.find_alphas(samples)?,
        })
    }
}

/// Largest `inner / outer` vertex radius ratio: the factor at which a
/// scaled copy of `outer` first touches `inner`.
fn touching_factor(inner: &BoundingShell, outer: &BoundingShell) -> f64 {
    inner
        .mesh()
        .radii()
        .iter()
        .zip(outer.mesh().radii())
        .filter(|(_, &o)| o > TOLERANCE)
        .map(|(i, o)| i / o)
        .fold(0.0, f64::max)
}

/// Pushes every outer vertex that sits inside the inner shell out to it.
fn clamp_outside(inner: &BoundingShell, outer: &mut BoundingShell) -> usize {
    let inner_radii = inner.mesh().radii().to_vec();
    let mesh = outer.mesh_mut();
    let mut clamped = 0;
    for (vertex, r_inner) in inner_radii.into_iter().enumerate() {
        if mesh.vertex_radius(vertex) < r_inner {
            mesh.set_vertex_radius(vertex, r_inner);
            clamped += 1;
        }
    }
    clamped
}

/// Scales `outer` to sit `fraction` of the way from touching `inner` (0)
/// to its current size (1).
fn place_between(inner: &BoundingShell, outer: &BoundingShell, fraction: f64) -> BoundingShell {
    let touch = touching_factor(inner, outer).min(1.0);
    outer.scale(touch + fraction * (1.0 - touch))
}

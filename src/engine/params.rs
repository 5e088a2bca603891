use crate::alpha::AlphaBands;
use crate::error::ConfigError;
use crate::fitting::FittingParams;
use crate::shell::ShellParams;

/// Which input cloud a shell is fitted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitSource {
    /// The background point cloud.
    #[default]
    Background,
    /// The foreground point cloud.
    Foreground,
    /// Background and foreground together.
    Combined,
}

/// Tuning parameters for [`MatteEngine`](super::MatteEngine).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatteParams {
    /// Shell resolution and positioning multiplier.
    pub shell: ShellParams,
    /// Iteration count and time budget for shrink and expand.
    pub fitting: FittingParams,
    /// Alpha split between the two bands of a three-shell matte.
    pub bands: AlphaBands,
    /// Inner-shell vertices closer to the reference than this stay put.
    pub inner_min_distance: f64,
    /// Scale applied to the inner shell after shrinking.
    pub inner_scale: f64,
    /// How far past its start radius the outer shell may expand.
    pub expand_delta: f64,
    /// Final outer placement: 0 touches the inner shell, 1 keeps the fit.
    pub outer_rescale_fraction: f64,
    /// Middle shell placement between inner (0) and outer (1), if any.
    pub middle_fraction: Option<f64>,
    /// Seed radius of the bounding-sphere oracle.
    pub oracle_tolerance: f64,
    /// Cloud the inner shell shrinks around.
    pub inner_source: FitSource,
    /// Cloud whose far points stop the outer shell.
    pub outer_source: FitSource,
}

impl Default for MatteParams {
    fn default() -> Self {
        Self {
            shell: ShellParams::default(),
            fitting: FittingParams::default(),
            bands: AlphaBands::default(),
            inner_min_distance: 0.0,
            inner_scale: 1.0,
            expand_delta: 0.5,
            outer_rescale_fraction: 1.0,
            middle_fraction: Some(0.5),
            oracle_tolerance: 1e-4,
            inner_source: FitSource::Background,
            outer_source: FitSource::Foreground,
        }
    }
}

impl MatteParams {
    /// Checks every numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NegativeParameter`] for negative values and
    /// [`ConfigError::OutOfRange`] for fractions outside `[0, 1]` or scale
    /// factors that are not strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shell.validate()?;
        self.bands.validate()?;
        ConfigError::check_non_negative("inner_min_distance", self.inner_min_distance)?;
        ConfigError::check_positive("inner_scale", self.inner_scale)?;
        ConfigError::check_non_negative("expand_delta", self.expand_delta)?;
        ConfigError::check_non_negative("oracle_tolerance", self.oracle_tolerance)?;
        ConfigError::check_range(
            "outer_rescale_fraction",
            self.outer_rescale_fraction,
            0.0,
            1.0,
        )?;
        if let Some(fraction) = self.middle_fraction {
            ConfigError::check_range("middle_fraction", fraction, 0.0, 1.0)?;
        }
        Ok(())
    }
}

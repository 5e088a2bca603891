use thiserror::Error;

/// Top-level error type for the shell matting engine.
#[derive(Debug, Error)]
pub enum MatteError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} must be greater than {min}")]
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        min: f64,
    },

    #[error("zero-length vector")]
    ZeroVector,

    #[error("query ray is coplanar with the selected shell triangle")]
    CoplanarRay,

    #[error("point cloud is empty")]
    EmptyPointCloud,
}

/// Errors detected while validating a matte configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required component is missing: {0}")]
    MissingComponent(&'static str),

    #[error("parameter {parameter} = {value} must not be negative")]
    NegativeParameter { parameter: &'static str, value: f64 },

    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Errors raised when an operation is called in the wrong lifecycle state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("alpha requested before the matte engine was analysed")]
    NotAnalysed,
}

/// Errors related to caller-supplied sample data.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Convenience type alias for results using [`MatteError`].
pub type Result<T> = std::result::Result<T, MatteError>;

impl ConfigError {
    /// Rejects a negative value for `parameter`.
    pub(crate) fn check_non_negative(
        parameter: &'static str,
        value: f64,
    ) -> std::result::Result<(), Self> {
        // NaN fails the comparison and is rejected alongside negatives.
        if value >= 0.0 {
            Ok(())
        } else {
            Err(Self::NegativeParameter { parameter, value })
        }
    }

    /// Rejects zero, negative and NaN values for `parameter`.
    pub(crate) fn check_positive(
        parameter: &'static str,
        value: f64,
    ) -> std::result::Result<(), Self> {
        Self::check_range(parameter, value, f64::MIN_POSITIVE, f64::INFINITY)
    }

    /// Rejects a value outside the inclusive range `[min, max]`.
    pub(crate) fn check_range(
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> std::result::Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                parameter,
                value,
                min,
                max,
            })
        }
    }
}

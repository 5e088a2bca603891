use crate::error::{ConfigError, Result};
use crate::math::{direction_and_distance, Point3};
use crate::shell::BoundingShell;

/// Two or three concentric shells ordered inner to outer.
///
/// The shells are expected to share their center with the background
/// reference passed to [`AlphaLocator::find_alphas`], and to be nested:
/// along every direction `inner <= middle <= outer`.
#[derive(Debug, Clone)]
pub struct NestedShells {
    inner: BoundingShell,
    middle: Option<BoundingShell>,
    outer: BoundingShell,
}

impl NestedShells {
    /// Creates a two-shell set.
    #[must_use]
    pub fn new(inner: BoundingShell, outer: BoundingShell) -> Self {
        Self {
            inner,
            middle: None,
            outer,
        }
    }

    /// Creates a three-shell set.
    #[must_use]
    pub fn with_middle(inner: BoundingShell, middle: BoundingShell, outer: BoundingShell) -> Self {
        Self {
            inner,
            middle: Some(middle),
            outer,
        }
    }

    /// Returns the innermost shell.
    #[must_use]
    pub fn inner(&self) -> &BoundingShell {
        &self.inner
    }

    /// Returns the middle shell, if any.
    #[must_use]
    pub fn middle(&self) -> Option<&BoundingShell> {
        self.middle.as_ref()
    }

    /// Returns the outermost shell.
    #[must_use]
    pub fn outer(&self) -> &BoundingShell {
        &self.outer
    }

    /// Number of shells in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.middle.is_some() {
            3
        } else {
            2
        }
    }

    /// Always `false`; a set holds at least two shells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Alpha ranges assigned to the two transition bands of a three-shell set.
///
/// Distances between inner and middle map to `[0, split)`, distances between
/// middle and outer map to `[split, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaBands {
    /// Alpha reached at the middle shell.
    pub split: f64,
}

impl Default for AlphaBands {
    fn default() -> Self {
        Self { split: 0.99 }
    }
}

impl AlphaBands {
    /// Checks that `split` lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] otherwise.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        ConfigError::check_range("split", self.split, 0.0, 1.0)
    }
}

/// Computes per-sample alpha from fitted shells.
pub trait AlphaLocator {
    /// Returns one alpha in `[0, 1]` per sample, in sample order.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell query fails.
    fn find_alphas(
        &self,
        shells: &NestedShells,
        samples: &[Point3],
        reference: &Point3,
    ) -> Result<Vec<f32>>;
}

/// Linear interpolation between shell distances along the ray from the
/// background reference through each sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellAlphaLocator {
    bands: AlphaBands,
}

impl ShellAlphaLocator {
    /// Creates a locator with the given three-shell band split.
    ///
    /// # Errors
    ///
    /// Returns an error if the split is outside `[0, 1]`.
    pub fn new(bands: AlphaBands) -> Result<Self> {
        bands.validate()?;
        Ok(Self { bands })
    }

    /// Returns the band split.
    #[must_use]
    pub fn bands(&self) -> &AlphaBands {
        &self.bands
    }

    /// Alpha of a single sample.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell query fails.
    #[allow(clippy::cast_possible_truncation)]
    pub fn find_alpha(
        &self,
        shells: &NestedShells,
        sample: &Point3,
        reference: &Point3,
    ) -> Result<f32> {
        let Some((direction, distance)) = direction_and_distance(reference, sample) else {
            return Ok(0.0);
        };

        let outer = shells.outer.find_distance(&direction)?;
        // A crossed pair collapses onto the outer surface, so anything past
        // the outer shell stays opaque.
        let inner = shells.inner.find_distance(&direction)?.min(outer);
        if distance < inner {
            return Ok(0.0);
        }
        if distance >= outer {
            return Ok(1.0);
        }

        let alpha = match &shells.middle {
            None => (distance - inner) / (outer - inner),
            Some(middle) => {
                let middle = middle.find_distance(&direction)?.clamp(inner, outer);
                let split = self.bands.split;
                if distance < middle {
                    split * (distance - inner) / (middle - inner)
                } else {
                    split + (1.0 - split) * (distance - middle) / (outer - middle)
                }
            }
        };
        Ok(alpha.clamp(0.0, 1.0) as f32)
    }
}

impl AlphaLocator for ShellAlphaLocator {
    #[cfg(not(feature = "rayon"))]
    fn find_alphas(
        &self,
        shells: &NestedShells,
        samples: &[Point3],
        reference: &Point3,
    ) -> Result<Vec<f32>> {
        samples
            .iter()
            .map(|sample| self.find_alpha(shells, sample, reference))
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn find_alphas(
        &self,
        shells: &NestedShells,
        samples: &[Point3],
        reference: &Point3,
    ) -> Result<Vec<f32>> {
        use rayon::prelude::*;

        samples
            .par_iter()
            .map(|sample| self.find_alpha(shells, sample, reference))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shell::{ShellParams, ShellTemplate};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn reference() -> Point3 {
        p(0.5, 0.5, 0.5)
    }

    fn sphere(radius: f64) -> BoundingShell {
        ShellTemplate::new(&ShellParams::default())
            .unwrap()
            .position(reference(), radius)
            .unwrap()
    }

    fn two_shells() -> NestedShells {
        NestedShells::new(sphere(0.1), sphere(0.3))
    }

    fn three_shells() -> NestedShells {
        NestedShells::with_middle(sphere(0.1), sphere(0.2), sphere(0.3))
    }

    // Straight up hits the pole vertices, so shell distances are exact.
    fn up(distance: f64) -> Point3 {
        reference() + nalgebra::Vector3::z() * distance
    }

    #[test]
    fn reference_is_transparent() {
        let locator = ShellAlphaLocator::default();
        let alphas = locator
            .find_alphas(&two_shells(), &[reference()], &reference())
            .unwrap();
        assert_eq!(alphas, vec![0.0]);
    }

    #[test]
    fn two_shell_boundaries_and_interpolation() {
        let locator = ShellAlphaLocator::default();
        let samples = [up(0.05), up(0.2), up(0.35), up(0.45)];
        let alphas = locator.find_alphas(&two_shells(), &samples, &reference()).unwrap();
        assert_eq!(alphas[0], 0.0);
        assert!((alphas[1] - 0.5).abs() < 1e-6);
        assert_eq!(alphas[2], 1.0);
        assert_eq!(alphas[3], 1.0);
    }

    #[test]
    fn three_shell_bands() {
        let locator = ShellAlphaLocator::new(AlphaBands { split: 0.8 }).unwrap();
        let samples = [up(0.15), up(0.2), up(0.25)];
        let alphas = locator.find_alphas(&three_shells(), &samples, &reference()).unwrap();
        assert!((alphas[0] - 0.4).abs() < 1e-6);
        assert!((alphas[1] - 0.8).abs() < 1e-6);
        assert!((alphas[2] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn monotonic_along_a_ray() {
        let locator = ShellAlphaLocator::default();
        let shells = three_shells();
        let dir = nalgebra::Vector3::new(0.3, -0.5, 0.2).normalize();
        let samples: Vec<Point3> = (0_u32..100)
            .map(|i| reference() + dir * (f64::from(i) * 0.004))
            .collect();
        let alphas = locator.find_alphas(&shells, &samples, &reference()).unwrap();
        for pair in alphas.windows(2) {
            assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
        }
        assert_eq!(alphas[0], 0.0);
        assert_eq!(alphas[99], 1.0);
    }

    #[test]
    fn crossed_shells_still_produce_valid_alpha() {
        let locator = ShellAlphaLocator::default();
        let crossed = NestedShells::new(sphere(0.3), sphere(0.1));
        let alphas = locator
            .find_alphas(&crossed, &[up(0.05), up(0.2), up(0.35)], &reference())
            .unwrap();
        assert_eq!(alphas, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn invalid_split_fails() {
        assert!(ShellAlphaLocator::new(AlphaBands { split: 1.5 }).is_err());
    }

    #[test]
    fn shell_count() {
        assert_eq!(two_shells().len(), 2);
        assert_eq!(three_shells().len(), 3);
    }
}

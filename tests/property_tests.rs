//! Property-based checks of the fitting and alpha invariants.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use shellmatte::alpha::{AlphaLocator, NestedShells, ShellAlphaLocator};
use shellmatte::background::BarycentreLocator;
use shellmatte::fitting::{FittingParams, RadialFitter, ShellFitter};
use shellmatte::math::{Point3, Vector3};
use shellmatte::segmentation::{ColourSegmenter, DistanceSegmenter};
use shellmatte::shell::{ShellParams, ShellTemplate};
use shellmatte::{MatteEngine, MatteInput, MatteParams};

/// Strategy for colours inside the unit cube.
fn colour() -> impl Strategy<Value = Point3> {
    (0.0..=1.0_f64, 0.0..=1.0_f64, 0.0..=1.0_f64).prop_map(|(r, g, b)| Point3::new(r, g, b))
}

/// Strategy for a small colour cloud.
fn cloud() -> impl Strategy<Value = Vec<Point3>> {
    prop::collection::vec(colour(), 1..40)
}

/// Strategy for a non-degenerate direction.
fn direction() -> impl Strategy<Value = Vector3> {
    (-1.0..=1.0_f64, -1.0..=1.0_f64, -1.0..=1.0_f64)
        .prop_filter("non-zero", |(x, y, z)| x * x + y * y + z * z > 1e-4)
        .prop_map(|(x, y, z)| Vector3::new(x, y, z).normalize())
}

/// Strategy for a tight backdrop cloud around a random colour.
fn backdrop() -> impl Strategy<Value = Vec<Point3>> {
    let offset = (-0.1..0.1_f64, -0.1..0.1_f64, -0.1..0.1_f64);
    (colour(), prop::collection::vec(offset, 1..30)).prop_map(|(centre, offsets)| {
        offsets
            .into_iter()
            .map(|(x, y, z)| centre + Vector3::new(x, y, z))
            .collect()
    })
}

fn template() -> ShellTemplate {
    ShellTemplate::new(&ShellParams {
        phi_faces: 8,
        theta_faces: 6,
        ..ShellParams::default()
    })
    .unwrap()
}

proptest! {
    #[test]
    fn segmentation_is_a_partition(
        points in cloud(),
        reference in colour(),
        radius in 0.0..1.0_f64,
    ) {
        let result = DistanceSegmenter.segment(&points, &reference, radius);
        prop_assert_eq!(result.len(), points.len());
        for p in &result.inner {
            prop_assert!((p - reference).norm_squared() <= radius * radius);
        }
        for p in &result.outer {
            prop_assert!((p - reference).norm_squared() > radius * radius);
        }
    }

    #[test]
    fn shrink_never_releases_points(points in cloud(), reference in colour()) {
        let mut shell = template().position(reference, 0.1).unwrap();
        let fitter = RadialFitter::new(FittingParams {
            iterations: 4,
            ..FittingParams::default()
        });
        let report = fitter.shrink(&mut shell, &points, &reference, 0.0).unwrap();
        prop_assert!(report.final_count >= report.baseline);
        prop_assert_eq!(shell.count_inside(&points).unwrap(), report.final_count);
    }

    #[test]
    fn expand_never_swallows_far_points(
        points in cloud(),
        reference in colour(),
        start in 0.05..0.3_f64,
    ) {
        let mut shell = template().position(reference, start).unwrap();
        let fitter = RadialFitter::new(FittingParams {
            iterations: 4,
            ..FittingParams::default()
        });
        let report = fitter
            .expand(&mut shell, &points, &DistanceSegmenter, &reference, start, start + 0.5)
            .unwrap();
        prop_assert_eq!(report.final_count, report.baseline);
        prop_assert!(shell.find_smallest_radius() >= start - 1e-12);
    }

    #[test]
    fn alpha_is_monotonic_along_rays(dir in direction(), reference in colour()) {
        let t = template();
        let shells = NestedShells::with_middle(
            t.position(reference, 0.1).unwrap(),
            t.position(reference, 0.2).unwrap(),
            t.position(reference, 0.4).unwrap(),
        );
        let samples: Vec<Point3> = (0_u32..60)
            .map(|i| reference + dir * (f64::from(i) * 0.01))
            .collect();
        let alphas = ShellAlphaLocator::default()
            .find_alphas(&shells, &samples, &reference)
            .unwrap();
        for pair in alphas.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        prop_assert_eq!(alphas[0], 0.0);
        prop_assert_eq!(alphas[59], 1.0);
    }

    #[test]
    fn scaling_round_trips(factor in 0.1..10.0_f64, dir in direction()) {
        let shell = template().position(Point3::new(0.5, 0.5, 0.5), 0.2).unwrap();
        let back = shell.scale(factor).scale(1.0 / factor);
        let a = shell.find_distance(&dir).unwrap();
        let b = back.find_distance(&dir).unwrap();
        prop_assert!((a - b).abs() < 1e-9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn analysed_shells_nest_along_every_ray(
        bg in backdrop(),
        fg in cloud(),
        dirs in prop::collection::vec(direction(), 64),
    ) {
        let input = MatteInput::with_estimated_reference(&fg, &bg, &BarycentreLocator).unwrap();
        let mut engine = MatteEngine::with_params(MatteParams::default(), input).unwrap();
        engine.analyse().unwrap();
        let shells = engine.shells().unwrap();
        let middle = shells.middle().unwrap();

        for dir in &dirs {
            let r_inner = shells.inner().find_distance(dir).unwrap();
            let r_middle = middle.find_distance(dir).unwrap();
            let r_outer = shells.outer().find_distance(dir).unwrap();
            prop_assert!(r_inner <= r_middle + 1e-9, "inner {} > middle {}", r_inner, r_middle);
            prop_assert!(r_middle <= r_outer + 1e-9, "middle {} > outer {}", r_middle, r_outer);
        }
    }

    #[test]
    fn analysed_alpha_is_clear_inside_and_opaque_outside(
        bg in backdrop(),
        fg in cloud(),
        dirs in prop::collection::vec(direction(), 16),
    ) {
        let input = MatteInput::with_estimated_reference(&fg, &bg, &BarycentreLocator).unwrap();
        let mut engine = MatteEngine::with_params(MatteParams::default(), input).unwrap();
        engine.analyse().unwrap();
        let shells = engine.shells().unwrap();
        let reference = engine.input().reference;

        for dir in &dirs {
            let r_inner = shells.inner().find_distance(dir).unwrap();
            let r_outer = shells.outer().find_distance(dir).unwrap();
            let samples = [
                reference + dir * (r_inner * 0.5),
                reference + dir * (r_outer + 0.01),
                reference + dir * (r_outer * 2.0 + 0.1),
            ];
            let alphas = engine.find_alphas(&samples).unwrap();
            prop_assert_eq!(alphas[0], 0.0);
            prop_assert_eq!(alphas[1], 1.0);
            prop_assert_eq!(alphas[2], 1.0);

            let ray: Vec<Point3> = (0_u32..=40)
                .map(|i| reference + dir * ((r_outer + 0.05) * f64::from(i) / 40.0))
                .collect();
            let alphas = engine.find_alphas(&ray).unwrap();
            for pair in alphas.windows(2) {
                prop_assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
            }
        }
    }
}

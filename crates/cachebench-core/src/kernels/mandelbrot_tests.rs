//! Tests for the Mandelbrot kernels and renderers.

use super::mandelbrot::{
    diverge, diverge_lanes, in_bounds, render, render_partitioned, render_rows, RenderMode,
    Viewport, MANDELBROT_LANES,
};
use crate::error::Error;

#[test]
fn test_origin_never_diverges() {
    assert_eq!(diverge(0.0, 0.0, 1500), 0);
}

#[test]
fn test_far_point_escapes_immediately() {
    assert_eq!(diverge(5.0, 5.0, 1500), 1);
    assert_eq!(diverge(-3.0, 0.0, 1500), 1);
}

#[test]
fn test_known_escape_counts() {
    // z1 = 1, z2 = 2, z3 = 5: escapes on the third update.
    assert_eq!(diverge(1.0, 0.0, 100), 3);
    // c = -2 cycles at z = 2, which stays on the boundary.
    assert_eq!(diverge(-2.0, 0.0, 100), 0);
    // c = i: 0 -> i -> -1+i -> -i -> -1+i ... bounded.
    assert_eq!(diverge(0.0, 1.0, 500), 0);
}

#[test]
fn test_escape_is_per_axis_not_modulus() {
    // |z1| = sqrt(2 * 1.9^2) > 2, but both parts stay inside [-2, 2].
    assert!(in_bounds(1.9, 1.9));
    assert!(!in_bounds(2.01, 0.0));
    assert!(!in_bounds(0.0, -2.01));
    assert!(!in_bounds(f64::NAN, 0.0));
    assert!(diverge(1.9, 1.9, 10) > 1);
}

#[test]
fn test_cap_limits_count() {
    // Escapes on iteration 3, so a cap of 2 reports bounded.
    assert_eq!(diverge(1.0, 0.0, 2), 0);
    assert_eq!(diverge(1.0, 0.0, 3), 3);
    assert_eq!(diverge(5.0, 5.0, 0), 0);
}

#[test]
fn test_lanes_match_scalar() {
    let caps = [0, 1, 2, 50, 1500];
    let rows: [[f64; MANDELBROT_LANES]; 5] = [
        [0.0, 5.0, -0.75, 0.25],
        [-2.0, -1.0, 0.3, 0.5],
        [-0.1, -0.1, -0.1, -0.1],
        [0.2501, 0.26, -1.401, 1.0],
        [-0.7435, -0.7436, 0.001, 3.0],
    ];
    for cap in caps {
        for c_re in rows {
            for c_im in [0.0, 0.1, -0.6, 1.0, 2.5] {
                let lanes = diverge_lanes(c_re, c_im, cap);
                for lane in 0..MANDELBROT_LANES {
                    assert_eq!(
                        lanes[lane],
                        diverge(c_re[lane], c_im, cap),
                        "c = {} + {c_im}i, cap {cap}",
                        c_re[lane]
                    );
                }
            }
        }
    }
}

#[test]
fn test_portable_lanes_match_dispatched() {
    let c_re = [-0.75, 0.26, -1.25, 0.0];
    for c_im in [0.0, 0.1, 0.35] {
        assert_eq!(
            super::portable::diverge_lanes(c_re, c_im, 800),
            diverge_lanes(c_re, c_im, 800)
        );
    }
}

#[test]
fn test_viewport_geometry() {
    let v = Viewport::new(400, 200, -0.5, 0.0, 1.0).unwrap();
    assert_eq!(v.pixel_width(), 0.01);
    let (re0, im0) = v.top_left();
    assert!((re0 - -2.5).abs() < 1e-12);
    assert!((im0 - 1.0).abs() < 1e-12);
    let (re, im) = v.coordinate(100, 250);
    assert!((re - 0.0).abs() < 1e-12);
    assert!((im - 0.0).abs() < 1e-12);
    assert_eq!(v.pixels(), 80_000);
}

#[test]
fn test_viewport_labels() {
    let label = |r: f64| Viewport::new(4, 4, 0.0, 0.0, r).unwrap().label();
    assert_eq!(label(1.0), "mandelbrot");
    assert_eq!(label(0.000_25), "shells");
    assert_eq!(label(0.000_4), "seastar");
    assert_eq!(label(0.01), "stuff");
    assert_eq!(label(3.5e-9), "galaxy");
    assert_eq!(label(0.5), "custom");
}

#[test]
fn test_viewport_rejects_invalid() {
    assert!(matches!(
        Viewport::new(0, 10, 0.0, 0.0, 1.0),
        Err(Error::InvalidArgument(_))
    ));
    assert!(Viewport::new(10, 10, 0.0, 0.0, 0.0).is_err());
    assert!(Viewport::new(10, 10, 0.0, 0.0, f64::NAN).is_err());
    assert!(Viewport::new(10, 10, f64::INFINITY, 0.0, 1.0).is_err());
}

#[test]
fn test_vectorized_render_matches_scalar() {
    // Width 23 leaves a 3-pixel scalar remainder per row.
    let v = Viewport::new(23, 17, -0.75, 0.1, 1.2).unwrap();
    let mut scalar = vec![0_u32; v.pixels()];
    let mut vectorized = vec![0_u32; v.pixels()];
    render(&v, 300, RenderMode::Scalar, &mut scalar);
    render(&v, 300, RenderMode::Vectorized, &mut vectorized);
    assert_eq!(scalar, vectorized);
    assert!(scalar.iter().any(|&c| c == 0));
    assert!(scalar.iter().any(|&c| c > 0));
}

#[test]
fn test_render_rows_writes_requested_band() {
    let v = Viewport::new(8, 6, 0.0, 0.0, 2.0).unwrap();
    let mut full = vec![0_u32; v.pixels()];
    render(&v, 100, RenderMode::Scalar, &mut full);

    let mut band = vec![0_u32; 2 * 8];
    render_rows(&v, 3..5, 100, RenderMode::Vectorized, &mut band);
    assert_eq!(&band[..], &full[3 * 8..5 * 8]);
}

#[test]
fn test_partitioned_render_matches_single() {
    let v = Viewport::new(31, 19, -0.5, 0.0, 1.0).unwrap();
    let mut single = vec![0_u32; v.pixels()];
    render(&v, 250, RenderMode::Scalar, &mut single);
    for workers in [1, 2, 4, 7, 40] {
        for mode in [RenderMode::Scalar, RenderMode::Vectorized] {
            let mut parallel = vec![u32::MAX; v.pixels()];
            render_partitioned(&v, 250, mode, workers, &mut parallel).unwrap();
            assert_eq!(single, parallel, "workers={workers} mode={mode:?}");
        }
    }
}

#[test]
fn test_partitioned_render_rejects_bad_arguments() {
    let v = Viewport::new(4, 4, 0.0, 0.0, 1.0).unwrap();
    let mut out = vec![0_u32; 15];
    assert!(render_partitioned(&v, 10, RenderMode::Scalar, 2, &mut out).is_err());
    let mut out = vec![0_u32; 16];
    assert!(matches!(
        render_partitioned(&v, 10, RenderMode::Scalar, 0, &mut out),
        Err(Error::InvalidArgument(_))
    ));
}

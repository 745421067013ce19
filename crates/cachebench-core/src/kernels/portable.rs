//! Portable lane-by-lane fallbacks for the vector kernels.
//!
//! Used when the CPU lacks AVX2 (or on non-x86 targets). They walk the data
//! in `LANES`-wide groups exactly like the intrinsic versions so that the
//! visiting order, and for Mandelbrot the per-lane results, are identical.

use crate::element::Element;

use super::mandelbrot::{in_bounds, MANDELBROT_LANES};

/// Increments `body` in `T::LANES`-wide groups.
#[inline]
pub(crate) fn increment_lanes<T: Element>(body: &mut [T], reverse: bool) {
    if reverse {
        for chunk in body.rchunks_exact_mut(T::LANES) {
            for x in chunk.iter_mut() {
                *x = x.increment();
            }
        }
    } else {
        for chunk in body.chunks_exact_mut(T::LANES) {
            for x in chunk.iter_mut() {
                *x = x.increment();
            }
        }
    }
}

/// `c[j] += a * b[j]`, one element at a time.
///
/// Uses the unfused [`Element::mul_add`], so float results can differ in the
/// last bit from the AVX2 path, which fuses.
#[inline]
pub(crate) fn axpy_lanes<T: Element>(c: &mut [T], b: &[T], a: T) {
    debug_assert_eq!(c.len(), b.len());
    for (cj, &bj) in c.iter_mut().zip(b.iter()) {
        *cj = cj.mul_add(a, bj);
    }
}

/// Masked Mandelbrot iteration over [`MANDELBROT_LANES`] points sharing
/// one imaginary part.
///
/// Mirrors the AVX2 kernel step for step: every lane computes the next `z`,
/// but only active lanes commit it and bump their counter.
pub(crate) fn diverge_lanes(
    c_re: [f64; MANDELBROT_LANES],
    c_im: f64,
    max_iterations: u32,
) -> [u32; MANDELBROT_LANES] {
    let mut z_re = [0.0_f64; MANDELBROT_LANES];
    let mut z_im = [0.0_f64; MANDELBROT_LANES];
    let mut counts = [0_u32; MANDELBROT_LANES];
    let mut escaped = [false; MANDELBROT_LANES];
    let mut active = [max_iterations > 0; MANDELBROT_LANES];

    while active.iter().any(|&a| a) {
        for lane in 0..MANDELBROT_LANES {
            if !active[lane] {
                continue;
            }
            let next_re = z_re[lane] * z_re[lane] - z_im[lane] * z_im[lane] + c_re[lane];
            let next_im = 2.0 * z_re[lane] * z_im[lane] + c_im;
            z_re[lane] = next_re;
            z_im[lane] = next_im;
            counts[lane] += 1;

            if !in_bounds(next_re, next_im) {
                escaped[lane] = true;
                active[lane] = false;
            } else if counts[lane] >= max_iterations {
                active[lane] = false;
            }
        }
    }

    let mut result = [0_u32; MANDELBROT_LANES];
    for lane in 0..MANDELBROT_LANES {
        if escaped[lane] {
            result[lane] = counts[lane];
        }
    }
    result
}

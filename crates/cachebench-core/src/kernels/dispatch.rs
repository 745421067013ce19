//! Runtime SIMD level detection and dispatch wiring.
//!
//! This module provides:
//! - `SimdLevel` enum for representing detected SIMD capability
//! - `simd_level()` for cached runtime detection
//! - The typed entry points the [`Element`](crate::Element) vector hooks and
//!   the Mandelbrot kernel route through

use super::mandelbrot::MANDELBROT_LANES;
use super::portable;

// =============================================================================
// Cached SIMD Level Detection
// =============================================================================

/// SIMD capability level detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// AVX2 + FMA available (x86_64 only).
    Avx2,
    /// Portable lane-by-lane fallback.
    Scalar,
}

/// Cached SIMD level - detected once at first use.
static SIMD_LEVEL: std::sync::OnceLock<SimdLevel> = std::sync::OnceLock::new();

/// Detects the best available SIMD level for the current CPU.
fn detect_simd_level() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return SimdLevel::Avx2;
        }
    }

    tracing::warn!("AVX2+FMA not detected, vectorized kernels use the portable fallback");
    SimdLevel::Scalar
}

/// Returns the cached SIMD capability level.
#[inline]
#[must_use]
pub fn simd_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(detect_simd_level)
}

// =============================================================================
// Increment hooks
// =============================================================================

macro_rules! increment_dispatch {
    ($name:ident, $ty:ty, $avx2:ident) => {
        /// Vector increment hook for
        #[doc = concat!("`", stringify!($ty), "`.")]
        #[inline]
        pub(crate) fn $name(body: &mut [$ty], reverse: bool) {
            debug_assert_eq!(body.len() % <$ty as crate::Element>::LANES, 0);
            debug_assert_eq!(body.as_ptr() as usize % crate::buffer::VECTOR_ALIGNMENT, 0);
            match simd_level() {
                // SAFETY: AVX2 was detected at runtime; alignment and length
                // preconditions are established by `kernels::vector::split_aligned`.
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Avx2 => unsafe { super::x86_avx2::$avx2(body, reverse) },
                _ => portable::increment_lanes(body, reverse),
            }
        }
    };
}

increment_dispatch!(increment_lanes_i32, i32, increment_i32_avx2);
increment_dispatch!(increment_lanes_i64, i64, increment_i64_avx2);
increment_dispatch!(increment_lanes_f32, f32, increment_f32_avx2);
increment_dispatch!(increment_lanes_f64, f64, increment_f64_avx2);

// =============================================================================
// Row multiply-accumulate hooks
// =============================================================================

macro_rules! axpy_dispatch {
    ($name:ident, $ty:ty, $avx2:ident) => {
        /// Broadcast-multiply-accumulate hook for
        #[doc = concat!("`", stringify!($ty), "`.")]
        #[inline]
        pub(crate) fn $name(c: &mut [$ty], b: &[$ty], a: $ty) {
            assert_eq!(c.len(), b.len(), "Row segment lengths must match");
            match simd_level() {
                // SAFETY: AVX2+FMA was detected at runtime; lengths asserted above.
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Avx2 => unsafe { super::x86_avx2::$avx2(c, b, a) },
                _ => portable::axpy_lanes(c, b, a),
            }
        }
    };
}

axpy_dispatch!(axpy_i32, i32, axpy_i32_avx2);
axpy_dispatch!(axpy_i64, i64, axpy_i64_avx2);
axpy_dispatch!(axpy_f32, f32, axpy_f32_avx2);
axpy_dispatch!(axpy_f64, f64, axpy_f64_avx2);

// =============================================================================
// Mandelbrot
// =============================================================================

/// Per-lane divergence counts for [`MANDELBROT_LANES`] adjacent points.
#[inline]
#[must_use]
pub fn diverge_lanes(
    c_re: [f64; MANDELBROT_LANES],
    c_im: f64,
    max_iterations: u32,
) -> [u32; MANDELBROT_LANES] {
    match simd_level() {
        // SAFETY: AVX2 was detected at runtime.
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 => unsafe { super::x86_avx2::diverge_avx2(c_re, c_im, max_iterations) },
        _ => portable::diverge_lanes(c_re, c_im, max_iterations),
    }
}

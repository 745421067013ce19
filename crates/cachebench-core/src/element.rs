//! Numeric element types exercised by the benchmarks.
//!
//! Every kernel is generic over [`Element`]. The trait carries the scalar
//! arithmetic (wrapping for integers, IEEE for floats) and two vector hooks
//! that route to the best kernel the CPU supports for that concrete type.

use std::fmt;

use bytemuck::Pod;

use crate::buffer::VECTOR_ALIGNMENT;
use crate::kernels::dispatch;

/// A numeric element stored in flat buffers and dense matrices.
///
/// Implemented for `i32`, `i64`, `f32` and `f64`.
pub trait Element: Pod + Default + PartialEq + fmt::Debug + Send + Sync {
    /// Short type name used in benchmark case names (`int`, `long`, ...).
    const NAME: &'static str;

    /// Elements per 256-bit vector register.
    const LANES: usize;

    /// Whether arithmetic on this type is exact (integers) or rounded (floats).
    const EXACT: bool;

    /// The multiplicative identity.
    const ONE: Self;

    /// `self + 1`, wrapping on integer overflow.
    #[must_use]
    fn increment(self) -> Self;

    /// `self + a * b`, wrapping on integer overflow, unfused for floats.
    #[must_use]
    fn mul_add(self, a: Self, b: Self) -> Self;

    /// Converts a small constant into this type.
    #[must_use]
    fn from_u8(value: u8) -> Self;

    /// Lossy widening used for tolerance checks and reporting.
    #[must_use]
    fn to_f64(self) -> f64;

    /// Increments every element of `body` once, [`LANES`](Self::LANES) at a time.
    ///
    /// `body` must start on a [`VECTOR_ALIGNMENT`] boundary and its length
    /// must be a multiple of `LANES`.
    fn increment_lanes(body: &mut [Self], reverse: bool);

    /// `c[j] += a * b[j]` for every `j`.
    ///
    /// `c` and `b` may have any length and alignment, but must be equally long.
    /// Floats may be computed fused or unfused depending on
    /// [`simd_level`](crate::kernels::simd_level).
    fn axpy_lanes(c: &mut [Self], b: &[Self], a: Self);

    /// Compares two values: exactly for integers, within `rel_tol` of the
    /// larger magnitude for floats.
    #[must_use]
    fn approx_eq(self, other: Self, rel_tol: f64) -> bool {
        if Self::EXACT {
            return self == other;
        }
        let (x, y) = (self.to_f64(), other.to_f64());
        let scale = x.abs().max(y.abs()).max(1.0);
        (x - y).abs() <= rel_tol * scale
    }
}

macro_rules! impl_int_element {
    ($ty:ty, $name:literal, $increment:path, $axpy:path) => {
        impl Element for $ty {
            const NAME: &'static str = $name;
            const LANES: usize = VECTOR_ALIGNMENT / std::mem::size_of::<$ty>();
            const EXACT: bool = true;
            const ONE: Self = 1;

            #[inline]
            fn increment(self) -> Self {
                self.wrapping_add(1)
            }

            #[inline]
            fn mul_add(self, a: Self, b: Self) -> Self {
                self.wrapping_add(a.wrapping_mul(b))
            }

            #[inline]
            fn from_u8(value: u8) -> Self {
                Self::from(value)
            }

            // Reason: reporting only; precision loss above 2^53 is acceptable.
            #[allow(clippy::cast_precision_loss)]
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn increment_lanes(body: &mut [Self], reverse: bool) {
                $increment(body, reverse);
            }

            #[inline]
            fn axpy_lanes(c: &mut [Self], b: &[Self], a: Self) {
                $axpy(c, b, a);
            }
        }
    };
}

macro_rules! impl_float_element {
    ($ty:ty, $name:literal, $increment:path, $axpy:path) => {
        impl Element for $ty {
            const NAME: &'static str = $name;
            const LANES: usize = VECTOR_ALIGNMENT / std::mem::size_of::<$ty>();
            const EXACT: bool = false;
            const ONE: Self = 1.0;

            #[inline]
            fn increment(self) -> Self {
                self + 1.0
            }

            #[inline]
            fn mul_add(self, a: Self, b: Self) -> Self {
                self + a * b
            }

            #[inline]
            fn from_u8(value: u8) -> Self {
                Self::from(value)
            }

            #[inline]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            #[inline]
            fn increment_lanes(body: &mut [Self], reverse: bool) {
                $increment(body, reverse);
            }

            #[inline]
            fn axpy_lanes(c: &mut [Self], b: &[Self], a: Self) {
                $axpy(c, b, a);
            }
        }
    };
}

impl_int_element!(
    i32,
    "int",
    dispatch::increment_lanes_i32,
    dispatch::axpy_i32
);
impl_int_element!(
    i64,
    "long",
    dispatch::increment_lanes_i64,
    dispatch::axpy_i64
);
impl_float_element!(
    f32,
    "float",
    dispatch::increment_lanes_f32,
    dispatch::axpy_f32
);
impl_float_element!(
    f64,
    "double",
    dispatch::increment_lanes_f64,
    dispatch::axpy_f64
);

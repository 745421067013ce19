//! AVX2 kernel implementations for x86_64.
//!
//! Contains the 256-bit increment kernels (aligned load/store), the
//! broadcast-multiply-accumulate row kernels used by the vectorized matrix
//! multiply (unaligned load/store, scalar remainder), and the masked
//! Mandelbrot divergence kernel.
//!
//! All functions require runtime AVX2 detection (plus FMA for the float
//! row kernels) before calling.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::similar_names)]

use std::arch::x86_64::*;

use super::mandelbrot::MANDELBROT_LANES;

// =============================================================================
// Increment
// =============================================================================

/// AVX2 increment for `i32`, 8 lanes, 4-way unrolled on the forward path.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2 (runtime detection in `dispatch`)
/// - `body` starts on a 32-byte boundary
/// - `body.len()` is a multiple of 8
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn increment_i32_avx2(body: &mut [i32], reverse: bool) {
    // SAFETY: Aligned loads/stores stay inside `body`:
    // - offset = c * 8 where c < chunks = len / 8
    let ptr = body.as_mut_ptr();
    let chunks = body.len() / 8;
    let one = _mm256_set1_epi32(1);

    if reverse {
        for c in (0..chunks).rev() {
            let p = ptr.add(c * 8).cast::<__m256i>();
            _mm256_store_si256(p, _mm256_add_epi32(_mm256_load_si256(p), one));
        }
        return;
    }

    let unrolled = chunks / 4;
    for u in 0..unrolled {
        let p0 = ptr.add(u * 32).cast::<__m256i>();
        let p1 = ptr.add(u * 32 + 8).cast::<__m256i>();
        let p2 = ptr.add(u * 32 + 16).cast::<__m256i>();
        let p3 = ptr.add(u * 32 + 24).cast::<__m256i>();

        let v0 = _mm256_add_epi32(_mm256_load_si256(p0), one);
        let v1 = _mm256_add_epi32(_mm256_load_si256(p1), one);
        let v2 = _mm256_add_epi32(_mm256_load_si256(p2), one);
        let v3 = _mm256_add_epi32(_mm256_load_si256(p3), one);

        _mm256_store_si256(p0, v0);
        _mm256_store_si256(p1, v1);
        _mm256_store_si256(p2, v2);
        _mm256_store_si256(p3, v3);
    }
    for c in unrolled * 4..chunks {
        let p = ptr.add(c * 8).cast::<__m256i>();
        _mm256_store_si256(p, _mm256_add_epi32(_mm256_load_si256(p), one));
    }
}

/// AVX2 increment for `i64`, 4 lanes.
///
/// # Safety
///
/// Same contract as [`increment_i32_avx2`] with a lane count of 4.
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn increment_i64_avx2(body: &mut [i64], reverse: bool) {
    let ptr = body.as_mut_ptr();
    let chunks = body.len() / 4;
    let one = _mm256_set1_epi64x(1);

    if reverse {
        for c in (0..chunks).rev() {
            let p = ptr.add(c * 4).cast::<__m256i>();
            _mm256_store_si256(p, _mm256_add_epi64(_mm256_load_si256(p), one));
        }
    } else {
        for c in 0..chunks {
            let p = ptr.add(c * 4).cast::<__m256i>();
            _mm256_store_si256(p, _mm256_add_epi64(_mm256_load_si256(p), one));
        }
    }
}

/// AVX2 increment for `f32`, 8 lanes.
///
/// # Safety
///
/// Same contract as [`increment_i32_avx2`].
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn increment_f32_avx2(body: &mut [f32], reverse: bool) {
    let ptr = body.as_mut_ptr();
    let chunks = body.len() / 8;
    let one = _mm256_set1_ps(1.0);

    if reverse {
        for c in (0..chunks).rev() {
            let p = ptr.add(c * 8);
            _mm256_store_ps(p, _mm256_add_ps(_mm256_load_ps(p), one));
        }
    } else {
        for c in 0..chunks {
            let p = ptr.add(c * 8);
            _mm256_store_ps(p, _mm256_add_ps(_mm256_load_ps(p), one));
        }
    }
}

/// AVX2 increment for `f64`, 4 lanes.
///
/// # Safety
///
/// Same contract as [`increment_i32_avx2`] with a lane count of 4.
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn increment_f64_avx2(body: &mut [f64], reverse: bool) {
    let ptr = body.as_mut_ptr();
    let chunks = body.len() / 4;
    let one = _mm256_set1_pd(1.0);

    if reverse {
        for c in (0..chunks).rev() {
            let p = ptr.add(c * 4);
            _mm256_store_pd(p, _mm256_add_pd(_mm256_load_pd(p), one));
        }
    } else {
        for c in 0..chunks {
            let p = ptr.add(c * 4);
            _mm256_store_pd(p, _mm256_add_pd(_mm256_load_pd(p), one));
        }
    }
}

// =============================================================================
// Row multiply-accumulate: c[j] += a * b[j]
// =============================================================================

/// AVX2 row kernel for `i32` (wrapping `mullo` + `add`).
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2
/// - `c.len() == b.len()`
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn axpy_i32_avx2(c: &mut [i32], b: &[i32], a: i32) {
    let len = c.len();
    let simd_len = len / 8;
    let va = _mm256_set1_epi32(a);
    let c_ptr = c.as_mut_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..simd_len {
        let offset = i * 8;
        let vb = _mm256_loadu_si256(b_ptr.add(offset).cast::<__m256i>());
        let vc = _mm256_loadu_si256(c_ptr.add(offset).cast::<__m256i>());
        let sum = _mm256_add_epi32(vc, _mm256_mullo_epi32(va, vb));
        _mm256_storeu_si256(c_ptr.add(offset).cast::<__m256i>(), sum);
    }

    for j in simd_len * 8..len {
        c[j] = c[j].wrapping_add(a.wrapping_mul(b[j]));
    }
}

/// Low 64 bits of a lane-wise 64x64 multiply, built from 32x32->64 products.
///
/// `a * b mod 2^64 = lo(a)*lo(b) + ((hi(a)*lo(b) + lo(a)*hi(b)) << 32)`
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn mullo_epi64(a: __m256i, b: __m256i) -> __m256i {
    let lo = _mm256_mul_epu32(a, b);
    let a_hi = _mm256_srli_epi64(a, 32);
    let b_hi = _mm256_srli_epi64(b, 32);
    let cross = _mm256_add_epi64(_mm256_mul_epu32(a_hi, b), _mm256_mul_epu32(a, b_hi));
    _mm256_add_epi64(lo, _mm256_slli_epi64(cross, 32))
}

/// AVX2 row kernel for `i64` using an emulated 64-bit `mullo`.
///
/// # Safety
///
/// Same contract as [`axpy_i32_avx2`].
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn axpy_i64_avx2(c: &mut [i64], b: &[i64], a: i64) {
    let len = c.len();
    let simd_len = len / 4;
    let va = _mm256_set1_epi64x(a);
    let c_ptr = c.as_mut_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..simd_len {
        let offset = i * 4;
        let vb = _mm256_loadu_si256(b_ptr.add(offset).cast::<__m256i>());
        let vc = _mm256_loadu_si256(c_ptr.add(offset).cast::<__m256i>());
        let sum = _mm256_add_epi64(vc, mullo_epi64(va, vb));
        _mm256_storeu_si256(c_ptr.add(offset).cast::<__m256i>(), sum);
    }

    for j in simd_len * 4..len {
        c[j] = c[j].wrapping_add(a.wrapping_mul(b[j]));
    }
}

/// AVX2+FMA row kernel for `f32`.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2+FMA
/// - `c.len() == b.len()`
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
pub(crate) unsafe fn axpy_f32_avx2(c: &mut [f32], b: &[f32], a: f32) {
    let len = c.len();
    let simd_len = len / 8;
    let va = _mm256_set1_ps(a);
    let c_ptr = c.as_mut_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..simd_len {
        let offset = i * 8;
        let vb = _mm256_loadu_ps(b_ptr.add(offset));
        let vc = _mm256_loadu_ps(c_ptr.add(offset));
        _mm256_storeu_ps(c_ptr.add(offset), _mm256_fmadd_ps(va, vb, vc));
    }

    for j in simd_len * 8..len {
        c[j] = a.mul_add(b[j], c[j]);
    }
}

/// AVX2+FMA row kernel for `f64`.
///
/// # Safety
///
/// Same contract as [`axpy_f32_avx2`].
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
pub(crate) unsafe fn axpy_f64_avx2(c: &mut [f64], b: &[f64], a: f64) {
    let len = c.len();
    let simd_len = len / 4;
    let va = _mm256_set1_pd(a);
    let c_ptr = c.as_mut_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..simd_len {
        let offset = i * 4;
        let vb = _mm256_loadu_pd(b_ptr.add(offset));
        let vc = _mm256_loadu_pd(c_ptr.add(offset));
        _mm256_storeu_pd(c_ptr.add(offset), _mm256_fmadd_pd(va, vb, vc));
    }

    for j in simd_len * 4..len {
        c[j] = a.mul_add(b[j], c[j]);
    }
}

// =============================================================================
// Mandelbrot divergence
// =============================================================================

/// Masked Mandelbrot iteration over 4 points sharing one imaginary part.
///
/// Lanes whose orbit left `[-2,2]x[-2,2]` or hit `max_iterations` stop
/// committing `z` and stop counting; the loop ends once every lane is idle.
/// Multiply and add are kept separate (no FMA) so the results match the
/// scalar kernel bit for bit.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2.
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn diverge_avx2(
    c_re: [f64; MANDELBROT_LANES],
    c_im: f64,
    max_iterations: u32,
) -> [u32; MANDELBROT_LANES] {
    let cr = _mm256_loadu_pd(c_re.as_ptr());
    let ci = _mm256_set1_pd(c_im);
    let two = _mm256_set1_pd(2.0);
    let minus_two = _mm256_set1_pd(-2.0);
    let ones = _mm256_set1_pd(1.0);
    let cap = _mm256_set1_pd(f64::from(max_iterations));

    let mut z_re = _mm256_setzero_pd();
    let mut z_im = _mm256_setzero_pd();
    let mut counts = _mm256_setzero_pd();
    let mut escaped = _mm256_setzero_pd();
    let mut active = if max_iterations > 0 {
        _mm256_cmp_pd(ones, ones, _CMP_EQ_OQ)
    } else {
        _mm256_setzero_pd()
    };

    while _mm256_movemask_pd(active) != 0 {
        let re_sq = _mm256_mul_pd(z_re, z_re);
        let im_sq = _mm256_mul_pd(z_im, z_im);
        let next_re = _mm256_add_pd(_mm256_sub_pd(re_sq, im_sq), cr);
        let next_im = _mm256_add_pd(_mm256_mul_pd(_mm256_mul_pd(two, z_re), z_im), ci);

        z_re = _mm256_blendv_pd(z_re, next_re, active);
        z_im = _mm256_blendv_pd(z_im, next_im, active);
        counts = _mm256_add_pd(counts, _mm256_and_pd(active, ones));

        let re_ok = _mm256_and_pd(
            _mm256_cmp_pd(next_re, two, _CMP_LE_OQ),
            _mm256_cmp_pd(next_re, minus_two, _CMP_GE_OQ),
        );
        let im_ok = _mm256_and_pd(
            _mm256_cmp_pd(next_im, two, _CMP_LE_OQ),
            _mm256_cmp_pd(next_im, minus_two, _CMP_GE_OQ),
        );
        let bounded = _mm256_and_pd(re_ok, im_ok);

        escaped = _mm256_or_pd(escaped, _mm256_andnot_pd(bounded, active));
        let below_cap = _mm256_cmp_pd(counts, cap, _CMP_LT_OQ);
        active = _mm256_and_pd(active, _mm256_and_pd(bounded, below_cap));
    }

    let mut lane_counts = [0.0_f64; MANDELBROT_LANES];
    _mm256_storeu_pd(lane_counts.as_mut_ptr(), counts);
    let escaped_bits = _mm256_movemask_pd(escaped);

    let mut result = [0_u32; MANDELBROT_LANES];
    for (lane, out) in result.iter_mut().enumerate() {
        if escaped_bits & (1 << lane) != 0 {
            *out = lane_counts[lane] as u32;
        }
    }
    result
}

//! Scalar iteration kernels.
//!
//! Each kernel increments every element of `data[range]` exactly once per
//! pass and repeats the pass `passes` times. Only the visiting order
//! differs, which is what the benchmarks measure:
//!
//! - sequential: ascending addresses
//! - reverse sequential: descending addresses
//! - jump: `jump_size` interleaved sub-sequences, each walked in cache-line hops
//! - reverse jump: the mirror image, sub-sequence `k` starting at `end - 1 - k`
//!
//! These also serve as the reference implementations for the vector
//! kernels and as their head/tail handlers.

use std::ops::Range;

use crate::element::Element;

/// Cache line size in bytes (standard for modern x86_64 and aarch64 CPUs).
pub const CACHE_LINE_BYTES: usize = 64;

/// Number of `T` elements per cache line, i.e. the stride of the jump kernels.
#[inline]
#[must_use]
pub const fn jump_size<T>() -> usize {
    let size = std::mem::size_of::<T>();
    if size >= CACHE_LINE_BYTES {
        1
    } else {
        CACHE_LINE_BYTES / size
    }
}

/// Increments `data[range]` in ascending order, `passes` times.
///
/// # Panics
///
/// Panics if `range` is out of bounds for `data`.
#[inline]
pub fn sequential_increment<T: Element>(data: &mut [T], range: Range<usize>, passes: usize) {
    let slice = &mut data[range];
    for _ in 0..passes {
        increment_forward(slice);
    }
}

/// Increments `data[range]` in descending order, `passes` times.
#[inline]
pub fn reverse_sequential_increment<T: Element>(
    data: &mut [T],
    range: Range<usize>,
    passes: usize,
) {
    let slice = &mut data[range];
    for _ in 0..passes {
        increment_backward(slice);
    }
}

/// Increments `data[range]` one cache-line stride at a time, `passes` times.
///
/// For each `k` in `0..jump_size`, the sub-sequence `start + k`,
/// `start + k + jump_size`, ... is walked to the end of the range before
/// moving on to `k + 1`.
pub fn jump_increment<T: Element>(data: &mut [T], range: Range<usize>, passes: usize) {
    let slice = &mut data[range];
    let jump = jump_size::<T>();
    let lanes = jump.min(slice.len());
    for _ in 0..passes {
        for k in 0..lanes {
            for x in slice[k..].iter_mut().step_by(jump) {
                *x = x.increment();
            }
        }
    }
}

/// Mirror of [`jump_increment`]: sub-sequence `k` starts at `end - 1 - k`
/// and walks down by `jump_size` until it passes `start`.
pub fn reverse_jump_increment<T: Element>(data: &mut [T], range: Range<usize>, passes: usize) {
    let slice = &mut data[range];
    let jump = jump_size::<T>();
    let len = slice.len();
    let lanes = jump.min(len);
    for _ in 0..passes {
        for k in 0..lanes {
            // Elements [0, len - k) reversed yield len-1-k, len-1-k-jump, ...
            for x in slice[..len - k].iter_mut().rev().step_by(jump) {
                *x = x.increment();
            }
        }
    }
}

/// Single ascending pass over `slice`.
#[inline]
pub(crate) fn increment_forward<T: Element>(slice: &mut [T]) {
    for x in slice.iter_mut() {
        *x = x.increment();
    }
}

/// Single descending pass over `slice`.
#[inline]
pub(crate) fn increment_backward<T: Element>(slice: &mut [T]) {
    for x in slice.iter_mut().rev() {
        *x = x.increment();
    }
}

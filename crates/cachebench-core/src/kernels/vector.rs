//! Vectorized sequential increment kernels.
//!
//! The range is cut into three parts:
//! - head: scalar, up to the first [`VECTOR_ALIGNMENT`] boundary
//! - body: aligned, a whole number of `T::LANES`-wide groups
//! - tail: scalar, the `< LANES` elements left over
//!
//! For buffers from [`Buffer::allocate_aligned`](crate::Buffer::allocate_aligned)
//! with a lane-aligned `start` the head is empty. No input size is rejected.

use std::ops::Range;

use crate::buffer::VECTOR_ALIGNMENT;
use crate::element::Element;

use super::scalar::{increment_backward, increment_forward};

/// Splits `slice` into `(head, body, tail)` as described in the module docs.
#[inline]
pub(crate) fn split_aligned<T: Element>(slice: &mut [T]) -> (&mut [T], &mut [T], &mut [T]) {
    let len = slice.len();
    // `align_offset` may report `usize::MAX` when no offset works; the
    // whole slice then goes to the head.
    let head = slice.as_ptr().align_offset(VECTOR_ALIGNMENT).min(len);
    let body = (len - head) / T::LANES * T::LANES;
    let (head_part, rest) = slice.split_at_mut(head);
    let (body_part, tail_part) = rest.split_at_mut(body);
    (head_part, body_part, tail_part)
}

/// Vectorized [`sequential_increment`](super::scalar::sequential_increment).
///
/// # Panics
///
/// Panics if `range` is out of bounds for `data`.
pub fn simd_sequential_increment<T: Element>(data: &mut [T], range: Range<usize>, passes: usize) {
    let (head, body, tail) = split_aligned(&mut data[range]);
    for _ in 0..passes {
        increment_forward(head);
        if !body.is_empty() {
            T::increment_lanes(body, false);
        }
        increment_forward(tail);
    }
}

/// Vectorized [`reverse_sequential_increment`](super::scalar::reverse_sequential_increment).
///
/// Walks tail, body and head from the high end down.
pub fn simd_reverse_sequential_increment<T: Element>(
    data: &mut [T],
    range: Range<usize>,
    passes: usize,
) {
    let (head, body, tail) = split_aligned(&mut data[range]);
    for _ in 0..passes {
        increment_backward(tail);
        if !body.is_empty() {
            T::increment_lanes(body, true);
        }
        increment_backward(head);
    }
}

//! Tests for `buffer` and `alloc_guard`.

use std::alloc::Layout;

use crate::alloc_guard::AllocGuard;
use crate::buffer::{Buffer, VECTOR_ALIGNMENT};
use crate::error::Error;

#[test]
fn test_alloc_guard_is_zeroed_and_aligned() {
    let layout = Layout::from_size_align(256, 64).unwrap();
    let guard = AllocGuard::zeroed(layout).unwrap();

    assert_eq!(guard.as_ptr() as usize % 64, 0);
    assert_eq!(guard.layout(), layout);
    // SAFETY: the guard owns 256 initialised bytes.
    let bytes = unsafe { std::slice::from_raw_parts(guard.as_ptr(), 256) };
    assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn test_alloc_guard_rejects_zero_size() {
    let layout = Layout::from_size_align(0, 8).unwrap();
    assert!(matches!(
        AllocGuard::zeroed(layout),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_allocate_aligned_address() {
    for len in [1, 7, 8, 33, 1000] {
        let buf = Buffer::<i32>::allocate_aligned(len, VECTOR_ALIGNMENT).unwrap();
        assert_eq!(buf.as_ptr() as usize % VECTOR_ALIGNMENT, 0, "len={len}");
        assert_eq!(buf.len(), len);
        assert!(!buf.is_empty());
        assert!(buf.iter().all(|&x| x == 0));
    }
}

#[test]
fn test_allocate_natural_alignment() {
    let buf = Buffer::<f64>::allocate(10).unwrap();
    assert_eq!(buf.alignment(), std::mem::align_of::<f64>());
    assert_eq!(buf.len(), 10);
}

#[test]
fn test_allocate_zero_length_is_invalid() {
    let err = Buffer::<i64>::allocate(0).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_allocate_non_power_of_two_alignment_is_invalid() {
    let err = Buffer::<i32>::allocate_aligned(16, 24).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_allocate_overflow_is_out_of_memory() {
    let err = Buffer::<i64>::allocate(usize::MAX / 2).unwrap_err();
    assert!(matches!(err, Error::OutOfMemory { .. }));
}

#[test]
fn test_filled_and_mutation() {
    let mut buf = Buffer::filled(12, VECTOR_ALIGNMENT, 7_i64).unwrap();
    assert!(buf.iter().all(|&x| x == 7));

    buf[3] = 42;
    assert_eq!(buf[3], 42);
    assert_eq!(buf.iter().filter(|&&x| x == 7).count(), 11);
}

#[test]
fn test_as_mut_ptr_matches_slice() {
    let buf = Buffer::<f32>::allocate_aligned(9, VECTOR_ALIGNMENT).unwrap();
    assert_eq!(buf.as_mut_ptr().cast_const(), buf.as_ptr());
}

#[test]
fn test_debug_omits_contents() {
    let buf = Buffer::<i32>::allocate_aligned(4, VECTOR_ALIGNMENT).unwrap();
    let debug = format!("{buf:?}");
    assert!(debug.contains("len: 4"));
    assert!(debug.contains("alignment: 32"));
}

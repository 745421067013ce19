//! Owned flat buffers of plain-old-data elements.
//!
//! A [`Buffer`] is the "flat buffer" of the data model: a contiguous,
//! fixed-length run of elements, owned by the benchmark case that created it
//! and freed exactly once when dropped. Buffers destined for the vectorized
//! kernels are produced by [`Buffer::allocate_aligned`] with
//! [`VECTOR_ALIGNMENT`].

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use bytemuck::Pod;

use crate::alloc_guard::AllocGuard;
use crate::error::{Error, Result};

/// Byte alignment of a 256-bit vector register.
pub const VECTOR_ALIGNMENT: usize = 32;

/// Fixed-length, zero-initialised buffer backed by a raw allocation.
pub struct Buffer<T: Pod> {
    guard: AllocGuard,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> Buffer<T> {
    /// Allocates `len` zeroed elements with the natural alignment of `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `len == 0`
    /// - [`Error::OutOfMemory`] if the byte size overflows or the allocator fails
    pub fn allocate(len: usize) -> Result<Self> {
        Self::allocate_aligned(len, std::mem::align_of::<T>())
    }

    /// Allocates `len` zeroed elements whose base address is a multiple of
    /// `alignment`.
    ///
    /// The underlying allocation is rounded up to the next multiple of
    /// `alignment`, so a vector load that starts inside the buffer never
    /// crosses the end of the allocation. [`len`](Self::len) still reports
    /// the requested element count.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `len == 0` or `alignment` is not a
    ///   power of two
    /// - [`Error::OutOfMemory`] if the byte size overflows or the allocator fails
    pub fn allocate_aligned(len: usize, alignment: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::invalid("buffer length must be > 0"));
        }
        if !alignment.is_power_of_two() {
            return Err(Error::invalid(format!(
                "alignment {alignment} is not a power of two"
            )));
        }
        let align = alignment.max(std::mem::align_of::<T>());

        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .and_then(|b| b.checked_next_multiple_of(align))
            .ok_or(Error::OutOfMemory { bytes: usize::MAX })?;
        let layout =
            Layout::from_size_align(bytes, align).map_err(|_| Error::OutOfMemory { bytes })?;

        let guard = AllocGuard::zeroed(layout)?;
        Ok(Self {
            guard,
            len,
            _marker: PhantomData,
        })
    }

    /// Allocates a buffer and fills every element with `value`.
    pub fn filled(len: usize, alignment: usize, value: T) -> Result<Self> {
        let mut buffer = Self::allocate_aligned(len, alignment)?;
        buffer.fill(value);
        Ok(buffer)
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: zero-length buffers cannot be constructed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Alignment the buffer was allocated with.
    #[inline]
    #[must_use]
    pub fn alignment(&self) -> usize {
        self.guard.layout().align()
    }

    /// Raw pointer to the first element.
    ///
    /// The pointer carries write provenance for the whole allocation even
    /// though it is obtained through `&self`. Writing through it is only
    /// sound while no other reference to the same elements is live, which
    /// the partitioning layer guarantees by handing each worker a disjoint
    /// element range.
    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&self) -> *mut T {
        self.guard.cast()
    }
}

impl<T: Pod> Deref for Buffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: The allocation holds at least `len` zero-initialised `T`s.
        // - Condition 1: `allocate_aligned` sized the layout as `len * size_of::<T>()` or more.
        // - Condition 2: `T: Pod`, so the all-zero bit pattern is a valid `T`.
        // Reason: Exposes the raw allocation as a typed slice.
        unsafe { std::slice::from_raw_parts(self.guard.cast::<T>(), self.len) }
    }
}

impl<T: Pod> DerefMut for Buffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: Same invariants as `deref`; `&mut self` guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.guard.cast::<T>(), self.len) }
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len)
            .field("alignment", &self.alignment())
            .finish_non_exhaustive()
    }
}

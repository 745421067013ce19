//! RAII guard for raw, zero-initialised allocations.
//!
//! Benchmark buffers need alignments the global `Vec` allocator does not
//! promise (32 bytes for 256-bit loads), so they are carved out with
//! `std::alloc` directly. The guard owns the allocation and releases it
//! exactly once on drop, which also covers unwinding out of a half-built
//! matrix.
//!
//! # Usage
//!
//! ```rust
//! use cachebench_core::alloc_guard::AllocGuard;
//! use std::alloc::Layout;
//!
//! let layout = Layout::from_size_align(1024, 32).unwrap();
//! let guard = AllocGuard::zeroed(layout)?;
//! assert_eq!(guard.as_ptr() as usize % 32, 0);
//! # Ok::<(), cachebench_core::Error>(())
//! ```

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

use crate::error::{Error, Result};

#[cfg(test)]
thread_local! {
    /// Guards allocated minus guards dropped on this thread.
    static LIVE_GUARDS: std::cell::Cell<isize> = const { std::cell::Cell::new(0) };
}

/// Number of guards allocated and not yet dropped on the current thread.
#[cfg(test)]
pub(crate) fn live_guards() -> isize {
    LIVE_GUARDS.with(std::cell::Cell::get)
}

/// RAII guard for raw allocations.
///
/// The memory is zero-filled on allocation, so every plain-old-data type is
/// valid to read from it immediately.
#[derive(Debug)]
pub struct AllocGuard {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AllocGuard {
    /// Allocates zero-filled memory with the given layout.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the layout size is zero
    /// - [`Error::OutOfMemory`] if the allocator returns null
    pub fn zeroed(layout: Layout) -> Result<Self> {
        if layout.size() == 0 {
            return Err(Error::invalid("cannot allocate a zero-sized buffer"));
        }

        // SAFETY: `alloc_zeroed` requires a valid non-zero layout.
        // - Condition 1: `layout.size() > 0` is checked above.
        // - Condition 2: `Layout` comes from std APIs and is therefore well-formed.
        // Reason: Raw allocation is required for caller-chosen alignment.
        let ptr = unsafe { alloc_zeroed(layout) };

        match NonNull::new(ptr) {
            Some(ptr) => {
                tracing::trace!(bytes = layout.size(), align = layout.align(), "allocated");
                #[cfg(test)]
                LIVE_GUARDS.with(|live| live.set(live.get() + 1));
                Ok(Self { ptr, layout })
            }
            None => Err(Error::OutOfMemory {
                bytes: layout.size(),
            }),
        }
    }

    /// Returns the raw pointer to the allocated memory.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Returns the layout used for this allocation.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Casts the pointer to a specific element type.
    #[inline]
    #[must_use]
    pub fn cast<T>(&self) -> *mut T {
        self.ptr.as_ptr().cast()
    }
}

impl Drop for AllocGuard {
    fn drop(&mut self) {
        // SAFETY: `dealloc` requires the original pointer/layout pair.
        // - Condition 1: `self.ptr` was produced by `alloc_zeroed(self.layout)` in `zeroed`.
        // - Condition 2: Drop runs at most once, so the memory is freed exactly once.
        // Reason: Manual deallocation is needed for raw-memory RAII.
        unsafe {
            dealloc(self.ptr.as_ptr(), self.layout);
        }
        #[cfg(test)]
        LIVE_GUARDS.with(|live| live.set(live.get() - 1));
    }
}

// SAFETY: `AllocGuard` is `Send` because it owns an allocation handle only.
// - Condition 1: No aliasing references are stored, only pointer + layout metadata.
// - Condition 2: Heap allocations are not thread-affine; freeing on another thread is sound.
// Reason: Buffers are created on the benchmark thread and read after worker join.
unsafe impl Send for AllocGuard {}

// SAFETY: `AllocGuard` is `Sync` because `&AllocGuard` only exposes the pointer value.
// - Condition 1: Dereferencing `as_ptr()` is already `unsafe` for the caller.
// - Condition 2: The guard itself holds no interior mutability.
// Reason: Workers share `&Buffer` handles while writing disjoint ranges.
unsafe impl Sync for AllocGuard {}

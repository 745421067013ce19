//! Dense square matrices in two memory layouts.
//!
//! [`RowMatrix`] owns one independently allocated buffer per row, the way a
//! pointer-to-pointer matrix is laid out. [`FlatMatrix`] owns one row-major
//! buffer of `n * n` elements. Both implement [`DenseMatrix`] and must give
//! identical multiplication results; only their cache behaviour differs,
//! which is what the matrix benchmarks compare.

use std::fmt;

use crate::buffer::{Buffer, VECTOR_ALIGNMENT};
use crate::element::Element;
use crate::error::{Error, Result};

/// Square `n x n` matrix with row-level access.
///
/// The multiply kernels write C through [`row_ptr`](Self::row_ptr) from
/// several workers at once, so the trait is `unsafe` to implement.
///
/// # Safety
///
/// Implementors must guarantee, for every `i < size()`:
///
/// - `row_ptr(i)` is non-null, aligned for `T` and valid for reads and
///   writes of `size()` consecutive elements for as long as `&self` lives.
/// - The `size()` elements behind `row_ptr(i)` are the same cells that
///   [`row`](Self::row) and [`row_mut`](Self::row_mut) return, and `row(i)`
///   has exactly `size()` elements.
/// - Distinct rows never overlap.
/// - `size()` does not change while the matrix is borrowed.
///
/// A safe `impl` is rejected by the compiler:
///
/// ```compile_fail
/// use cachebench_core::DenseMatrix;
///
/// struct Null;
///
/// impl DenseMatrix<i32> for Null {
///     fn size(&self) -> usize { 4 }
///     fn row(&self, _: usize) -> &[i32] { &[] }
///     fn row_mut(&mut self, _: usize) -> &mut [i32] { &mut [] }
///     fn row_ptr(&self, _: usize) -> *mut i32 { std::ptr::null_mut() }
/// }
/// ```
pub unsafe trait DenseMatrix<T: Element>: Sync {
    /// Edge length `n`.
    fn size(&self) -> usize;

    /// Row `i` as a slice of `n` elements.
    fn row(&self, i: usize) -> &[T];

    /// Row `i` as a mutable slice of `n` elements.
    fn row_mut(&mut self, i: usize) -> &mut [T];

    /// Write pointer to the first element of row `i`.
    ///
    /// Lets several workers write disjoint cells of one matrix through a
    /// shared reference. Callers must not hold a slice obtained from
    /// [`row`](Self::row) or [`row_mut`](Self::row_mut) over the cells they
    /// write, and no two writers may touch the same cell.
    ///
    /// # Panics
    ///
    /// Panics if `i >= size()`.
    fn row_ptr(&self, i: usize) -> *mut T;

    /// Element `(i, j)`.
    #[inline]
    fn get(&self, i: usize, j: usize) -> T {
        self.row(i)[j]
    }

    /// Sets element `(i, j)`.
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: T) {
        self.row_mut(i)[j] = value;
    }

    /// Sets every element to `value`.
    fn fill(&mut self, value: T) {
        for i in 0..self.size() {
            self.row_mut(i).fill(value);
        }
    }
}

fn check_edge(n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::invalid("matrix edge must be > 0"));
    }
    Ok(())
}

// =============================================================================
// Row-per-allocation layout
// =============================================================================

/// Matrix stored as `n` separately allocated rows.
///
/// Each row is aligned to [`VECTOR_ALIGNMENT`]. Dropping the matrix (or
/// calling [`free`](Self::free)) releases every row and then the row table.
pub struct RowMatrix<T: Element> {
    rows: Vec<Buffer<T>>,
}

impl<T: Element> RowMatrix<T> {
    /// Allocates `n` zeroed rows of `n` elements each.
    ///
    /// If any row fails to allocate, the rows already obtained are released
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `n == 0`
    /// - [`Error::OutOfMemory`] if the row table or any row cannot be allocated
    pub fn allocate(n: usize) -> Result<Self> {
        Self::allocate_with(n, |_| Buffer::allocate_aligned(n, VECTOR_ALIGNMENT))
    }

    /// Same as [`allocate`](Self::allocate) with a caller-supplied row allocator.
    pub(crate) fn allocate_with<F>(n: usize, mut alloc_row: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<Buffer<T>>,
    {
        check_edge(n)?;
        let mut rows: Vec<Buffer<T>> = Vec::new();
        rows.try_reserve_exact(n)
            .map_err(|_| Error::OutOfMemory {
                bytes: n.saturating_mul(std::mem::size_of::<Buffer<T>>()),
            })?;

        for i in 0..n {
            match alloc_row(i) {
                Ok(row) if row.len() != n => {
                    return Err(Error::invalid(format!(
                        "row {i} has {} elements, expected {n}",
                        row.len()
                    )));
                }
                Ok(row) => rows.push(row),
                Err(e) => {
                    tracing::debug!(row = i, n, released = rows.len(), "Row allocation failed");
                    // `rows` drops here, freeing every row allocated so far.
                    return Err(e);
                }
            }
        }

        tracing::debug!(n, element = T::NAME, "Allocated row matrix");
        Ok(Self { rows })
    }

    /// Releases all rows, then the row table.
    pub fn free(self) {
        drop(self);
    }
}

// SAFETY: every row is its own `Buffer` of exactly `n` elements, with
// `n == rows.len()`; `row_ptr` and `row` address the same buffer, and
// separate allocations never overlap. `rows` is not resized after
// construction.
unsafe impl<T: Element> DenseMatrix<T> for RowMatrix<T> {
    #[inline]
    fn size(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    fn row(&self, i: usize) -> &[T] {
        &self.rows[i]
    }

    #[inline]
    fn row_mut(&mut self, i: usize) -> &mut [T] {
        &mut self.rows[i]
    }

    #[inline]
    fn row_ptr(&self, i: usize) -> *mut T {
        self.rows[i].as_mut_ptr()
    }
}

impl<T: Element> fmt::Debug for RowMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMatrix")
            .field("n", &self.rows.len())
            .field("element", &T::NAME)
            .finish()
    }
}

// =============================================================================
// Flat row-major layout
// =============================================================================

/// Matrix stored as one row-major buffer of `n * n` elements.
pub struct FlatMatrix<T: Element> {
    data: Buffer<T>,
    n: usize,
}

impl<T: Element> FlatMatrix<T> {
    /// Allocates a zeroed `n x n` matrix aligned to [`VECTOR_ALIGNMENT`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `n == 0`
    /// - [`Error::OutOfMemory`] if `n * n` overflows or the allocation fails
    pub fn allocate(n: usize) -> Result<Self> {
        check_edge(n)?;
        let len = n
            .checked_mul(n)
            .ok_or(Error::OutOfMemory { bytes: usize::MAX })?;
        let data = Buffer::allocate_aligned(len, VECTOR_ALIGNMENT)?;
        tracing::debug!(n, element = T::NAME, "Allocated flat matrix");
        Ok(Self { data, n })
    }

    /// The whole matrix, row-major.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

// SAFETY: `data` holds `n * n` elements; row `i` is the `n`-element run at
// offset `i * n` in both `row` and `row_ptr`, so rows are disjoint. `n` is
// fixed at construction.
unsafe impl<T: Element> DenseMatrix<T> for FlatMatrix<T> {
    #[inline]
    fn size(&self) -> usize {
        self.n
    }

    #[inline]
    fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    #[inline]
    fn row_mut(&mut self, i: usize) -> &mut [T] {
        let n = self.n;
        &mut self.data[i * n..(i + 1) * n]
    }

    #[inline]
    fn row_ptr(&self, i: usize) -> *mut T {
        assert!(i < self.n, "row {i} out of bounds for {0}x{0} matrix", self.n);
        // SAFETY: `i < n`, so `i * n` is within the `n * n` allocation.
        unsafe { self.data.as_mut_ptr().add(i * self.n) }
    }

    fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: Element> fmt::Debug for FlatMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMatrix")
            .field("n", &self.n)
            .field("element", &T::NAME)
            .finish()
    }
}

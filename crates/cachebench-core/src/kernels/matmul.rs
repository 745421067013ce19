//! Matrix multiply kernels: `C += A * B` for square [`DenseMatrix`] operands.
//!
//! Four loop orders over the same arithmetic:
//!
//! | Order        | Loops                         | Inner access on B      |
//! |--------------|-------------------------------|------------------------|
//! | `Naive`      | i, j, k                       | column walk            |
//! | `Optimized`  | i, k, j                       | row walk               |
//! | `Blocked`    | [`BLOCK_EDGE`] tiles, then ikj | row walk inside a tile |
//! | `Vectorized` | i, k, then `LANES`-wide j      | row walk, 256-bit      |
//!
//! The first three accumulate each `C[i][j]` over `k` in ascending order and
//! agree bit for bit. The vectorized order fuses the float multiply-add only
//! when [`simd_level`](crate::kernels::simd_level) reports AVX2; the portable
//! fallback rounds twice. Vectorized float results therefore depend on the
//! host and agree with the scalar orders only within a rounding tolerance.
//! Within one process every split of C gives the same bits.
//!
//! Every order is implemented once, as a kernel over a [`Block`] of C. The
//! single-threaded entry points run it on the whole matrix;
//! [`multiply_parallel`] runs it on the blocks of [`split_matrix`].

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::{Error, Result};
use crate::matrix::DenseMatrix;
use crate::partition::{for_each_block, split_matrix, Block};

/// Edge length of the square tiles used by the blocked order.
pub const BLOCK_EDGE: usize = 64;

/// Loop order of a matrix multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiplyOrder {
    /// i, j, k.
    Naive,
    /// i, k, j.
    Optimized,
    /// Tiled i, k, j.
    Blocked,
    /// i, k with a vectorized j loop.
    Vectorized,
}

impl MultiplyOrder {
    /// All orders, in benchmark order.
    pub const ALL: [Self; 4] = [Self::Naive, Self::Optimized, Self::Blocked, Self::Vectorized];

    /// Name used in benchmark case names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::Optimized => "optimized",
            Self::Blocked => "blocked",
            Self::Vectorized => "vectorized",
        }
    }
}

fn check_operands<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &M) -> Result<usize> {
    let n = c.size();
    if a.size() != n || b.size() != n {
        return Err(Error::invalid(format!(
            "matrix sizes differ: A is {}, B is {}, C is {n}",
            a.size(),
            b.size()
        )));
    }
    Ok(n)
}

/// Computes `C += A * B` on the calling thread.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the three matrices differ in size.
pub fn multiply<T, M>(order: MultiplyOrder, a: &M, b: &M, c: &mut M) -> Result<()>
where
    T: Element,
    M: DenseMatrix<T>,
{
    let n = check_operands(a, b, c)?;
    let c: &M = c;
    // SAFETY: `c` was borrowed mutably, so this call is its only user and
    // the single block covers each cell once.
    unsafe { multiply_block(order, a, b, c, &Block::full(n)) };
    Ok(())
}

/// Naive `C += A * B` (i, j, k).
pub fn naive_multiply<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &mut M) -> Result<()> {
    multiply(MultiplyOrder::Naive, a, b, c)
}

/// Cache-friendly `C += A * B` (i, k, j).
pub fn optimized_multiply<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &mut M) -> Result<()> {
    multiply(MultiplyOrder::Optimized, a, b, c)
}

/// Tiled `C += A * B` with [`BLOCK_EDGE`]-sized tiles.
pub fn blocked_multiply<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &mut M) -> Result<()> {
    multiply(MultiplyOrder::Blocked, a, b, c)
}

/// Vectorized (i, k, j) `C += A * B` with a scalar column remainder.
pub fn simd_multiply<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &mut M) -> Result<()> {
    multiply(MultiplyOrder::Vectorized, a, b, c)
}

/// Computes `C += A * B` with C split across `workers` threads.
///
/// Uses the 2-D grid from [`split_matrix`] when `workers` is a perfect
/// square and row bands otherwise. Returns after all workers have joined.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `workers == 0` or the matrices
/// differ in size.
pub fn multiply_parallel<T, M>(
    order: MultiplyOrder,
    a: &M,
    b: &M,
    c: &mut M,
    workers: usize,
) -> Result<()>
where
    T: Element,
    M: DenseMatrix<T>,
{
    let n = check_operands(a, b, c)?;
    let blocks = split_matrix(n, workers)?;
    let c: &M = c;
    for_each_block(&blocks, |block| {
        // SAFETY: `split_matrix` blocks are pairwise disjoint, and `c` is
        // not otherwise accessed until every worker has joined.
        unsafe { multiply_block(order, a, b, c, block) };
    });
    Ok(())
}

/// Row `i` of C restricted to `cols`.
///
/// # Safety
///
/// No other live reference may cover these cells.
#[inline]
unsafe fn c_segment<'c, T: Element, M: DenseMatrix<T>>(
    c: &'c M,
    i: usize,
    cols: &Range<usize>,
) -> &'c mut [T] {
    debug_assert!(cols.end <= c.size());
    // SAFETY: the `DenseMatrix` contract makes `row_ptr(i)` valid for `n`
    // elements, and `cols.end <= n`.
    unsafe { std::slice::from_raw_parts_mut(c.row_ptr(i).add(cols.start), cols.len()) }
}

/// Runs `order` on the cells of C named by `block`.
///
/// # Safety
///
/// The caller must have exclusive access to the block's cells of `c` for
/// the duration of the call.
unsafe fn multiply_block<T: Element, M: DenseMatrix<T>>(
    order: MultiplyOrder,
    a: &M,
    b: &M,
    c: &M,
    block: &Block,
) {
    if block.area() == 0 {
        return;
    }
    // SAFETY: forwarded from the caller.
    unsafe {
        match order {
            MultiplyOrder::Naive => naive_block(a, b, c, block),
            MultiplyOrder::Optimized => optimized_block(a, b, c, block),
            MultiplyOrder::Blocked => blocked_block(a, b, c, block),
            MultiplyOrder::Vectorized => vectorized_block(a, b, c, block),
        }
    }
}

unsafe fn naive_block<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &M, block: &Block) {
    let n = a.size();
    for i in block.rows.clone() {
        let a_row = a.row(i);
        // SAFETY: exclusive per `multiply_block`.
        let c_row = unsafe { c_segment(c, i, &block.cols) };
        for (cij, j) in c_row.iter_mut().zip(block.cols.clone()) {
            let mut acc = *cij;
            for k in 0..n {
                acc = acc.mul_add(a_row[k], b.row(k)[j]);
            }
            *cij = acc;
        }
    }
}

unsafe fn optimized_block<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &M, block: &Block) {
    let n = a.size();
    for i in block.rows.clone() {
        let a_row = a.row(i);
        // SAFETY: exclusive per `multiply_block`.
        let c_row = unsafe { c_segment(c, i, &block.cols) };
        for k in 0..n {
            let aik = a_row[k];
            let b_row = &b.row(k)[block.cols.clone()];
            for (cij, &bkj) in c_row.iter_mut().zip(b_row) {
                *cij = cij.mul_add(aik, bkj);
            }
        }
    }
}

unsafe fn blocked_block<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &M, block: &Block) {
    let n = a.size();
    let Block { rows, cols } = block;

    for i0 in rows.clone().step_by(BLOCK_EDGE) {
        let i_end = (i0 + BLOCK_EDGE).min(rows.end);
        for j0 in cols.clone().step_by(BLOCK_EDGE) {
            let tile_cols = j0..(j0 + BLOCK_EDGE).min(cols.end);
            for k0 in (0..n).step_by(BLOCK_EDGE) {
                let k_end = (k0 + BLOCK_EDGE).min(n);
                for i in i0..i_end {
                    let a_row = a.row(i);
                    // SAFETY: `tile_cols` lies inside `block.cols`.
                    let c_row = unsafe { c_segment(c, i, &tile_cols) };
                    for k in k0..k_end {
                        let aik = a_row[k];
                        let b_row = &b.row(k)[tile_cols.clone()];
                        for (cij, &bkj) in c_row.iter_mut().zip(b_row) {
                            *cij = cij.mul_add(aik, bkj);
                        }
                    }
                }
            }
        }
    }
}

unsafe fn vectorized_block<T: Element, M: DenseMatrix<T>>(a: &M, b: &M, c: &M, block: &Block) {
    let n = a.size();
    for i in block.rows.clone() {
        let a_row = a.row(i);
        // SAFETY: exclusive per `multiply_block`.
        let c_row = unsafe { c_segment(c, i, &block.cols) };
        for k in 0..n {
            T::axpy_lanes(c_row, &b.row(k)[block.cols.clone()], a_row[k]);
        }
    }
}

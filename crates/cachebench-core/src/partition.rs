//! Static work partitioning and worker fan-out.
//!
//! Every multi-threaded case follows the same shape: split the index space
//! into disjoint pieces, spawn one scoped worker per piece, join them all
//! before returning. There is no work stealing and no rebalancing; the
//! split formula alone guarantees that no two workers write the same
//! address, so the kernels run without locks.
//!
//! Remainder rule: `total` items over `workers` give `total / workers`
//! items each, and the first `total % workers` workers take one more.

use std::ops::Range;

use crate::element::Element;
use crate::error::{Error, Result};

/// Rectangular piece of an `n x n` matrix assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    /// Row range, half-open.
    pub rows: Range<usize>,
    /// Column range, half-open.
    pub cols: Range<usize>,
}

impl Block {
    /// The block covering a whole `n x n` matrix.
    #[must_use]
    pub fn full(n: usize) -> Self {
        Self {
            rows: 0..n,
            cols: 0..n,
        }
    }

    /// Number of cells in the block.
    #[must_use]
    pub fn area(&self) -> usize {
        self.rows.len() * self.cols.len()
    }
}

fn check_workers(workers: usize) -> Result<()> {
    if workers == 0 {
        return Err(Error::invalid("worker count must be > 0"));
    }
    Ok(())
}

/// Splits `0..total` into `workers` contiguous ranges.
///
/// The ranges are returned in ascending order, cover `0..total` exactly once
/// and differ in length by at most one. When `workers > total` the trailing
/// ranges are empty.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `total == 0` or `workers == 0`.
///
/// # Example
///
/// ```
/// use cachebench_core::partition::split_range;
///
/// let ranges = split_range(10, 3)?;
/// assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
/// # Ok::<(), cachebench_core::Error>(())
/// ```
pub fn split_range(total: usize, workers: usize) -> Result<Vec<Range<usize>>> {
    check_workers(workers)?;
    if total == 0 {
        return Err(Error::invalid("cannot partition an empty index space"));
    }

    let base = total / workers;
    let remainder = total % workers;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for w in 0..workers {
        let len = base + usize::from(w < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    debug_assert_eq!(start, total);
    Ok(ranges)
}

/// Side of the square worker grid, if `workers` is a perfect square.
#[must_use]
pub fn grid_side(workers: usize) -> Option<usize> {
    let side = isqrt(workers);
    (side * side == workers).then_some(side)
}

// Newton iteration; `usize::isqrt` needs a newer toolchain than the MSRV.
fn isqrt(n: usize) -> usize {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Splits an `n x n` matrix into one [`Block`] per worker.
///
/// A perfect-square worker count is laid out as a `side x side` grid, with
/// rows and columns split independently by [`split_range`]. Any other count
/// falls back to row bands spanning all columns.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `n == 0` or `workers == 0`.
pub fn split_matrix(n: usize, workers: usize) -> Result<Vec<Block>> {
    check_workers(workers)?;
    let blocks: Vec<Block> = match grid_side(workers) {
        Some(side) if side > 1 => {
            let rows = split_range(n, side)?;
            let cols = split_range(n, side)?;
            rows.iter()
                .flat_map(|r| {
                    cols.iter().map(move |c| Block {
                        rows: r.clone(),
                        cols: c.clone(),
                    })
                })
                .collect()
        }
        _ => split_range(n, workers)?
            .into_iter()
            .map(|rows| Block { rows, cols: 0..n })
            .collect(),
    };
    tracing::debug!(
        n,
        workers,
        blocks = blocks.len(),
        grid = grid_side(workers).is_some(),
        "Matrix partitioned"
    );
    Ok(blocks)
}

/// Runs `f` on contiguous chunks of `data`, one scoped worker per chunk.
///
/// `data` is viewed as `data.len() / unit` records of `unit` items (a pixel
/// row, say). Records are split with [`split_range`]; `f` receives the
/// record range and the matching sub-slice. Returns after every worker has
/// finished.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `workers == 0`, `unit == 0`, `data`
/// is empty, or `data.len()` is not a multiple of `unit`.
pub fn for_each_chunk<T, F>(data: &mut [T], unit: usize, workers: usize, f: F) -> Result<()>
where
    T: Send,
    F: Fn(Range<usize>, &mut [T]) + Sync,
{
    if unit == 0 || data.len() % unit != 0 {
        return Err(Error::invalid(format!(
            "data of length {} is not a whole number of {unit}-item records",
            data.len()
        )));
    }
    let ranges = split_range(data.len() / unit, workers)?;
    tracing::debug!(records = data.len() / unit, workers, "Fanning out chunks");

    if workers == 1 {
        f(0..data.len() / unit, data);
        return Ok(());
    }

    let f = &f;
    std::thread::scope(|s| {
        let mut remaining = data;
        for range in ranges {
            let (chunk, rest) = remaining.split_at_mut(range.len() * unit);
            remaining = rest;
            if range.is_empty() {
                continue;
            }
            s.spawn(move || f(range, chunk));
        }
    });
    Ok(())
}

/// Runs `f` once per block, one scoped worker per block, and joins them.
///
/// The blocks themselves carry no data: `f` is responsible for touching only
/// the cells its block names. Blocks from [`split_matrix`] are disjoint, so
/// writers driven by them never overlap.
pub fn for_each_block<F>(blocks: &[Block], f: F)
where
    F: Fn(&Block) + Sync,
{
    if let [only] = blocks {
        f(only);
        return;
    }
    let f = &f;
    std::thread::scope(|s| {
        for block in blocks.iter().filter(|b| b.area() > 0) {
            s.spawn(move || f(block));
        }
    });
}

/// Raw pointer that may cross a thread boundary.
///
/// Only used where workers write provably disjoint elements of one buffer
/// that cannot be split into contiguous slices.
#[derive(Debug)]
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

// SAFETY: `SendPtr` is a plain address. Every use site guarantees that
// concurrent accesses through copies of it target disjoint elements.
unsafe impl<T: Send> Send for SendPtr<T> {}
// SAFETY: See the `Send` impl above.
unsafe impl<T: Send> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    #[inline]
    pub(crate) fn get(self) -> *mut T {
        self.0
    }
}

/// Interleaved ("neighbour") increment: worker `w` of `workers` increments
/// indices `w, w + workers, w + 2 * workers, ...`, `passes` times.
///
/// Adjacent elements belong to different workers, so every cache line is
/// written by several threads at once. Each index still has exactly one
/// writer.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `data` is empty or `workers == 0`.
pub fn interleaved_increment<T: Element>(
    data: &mut [T],
    workers: usize,
    passes: usize,
) -> Result<()> {
    check_workers(workers)?;
    if data.is_empty() {
        return Err(Error::invalid("cannot partition an empty index space"));
    }
    let len = data.len();
    let base = SendPtr(data.as_mut_ptr());
    tracing::debug!(len, workers, "Fanning out interleaved increment");

    std::thread::scope(|s| {
        for w in 0..workers.min(len) {
            s.spawn(move || {
                let ptr = base.get();
                for _ in 0..passes {
                    for i in (w..len).step_by(workers) {
                        // SAFETY: `i < len`, so the pointer stays inside
                        // `data`. Index `i` belongs to residue class
                        // `i % workers == w`, which no other worker visits,
                        // and the scope holds the only borrow of `data`.
                        unsafe {
                            let x = ptr.add(i);
                            *x = (*x).increment();
                        }
                    }
                }
            });
        }
    });
    Ok(())
}

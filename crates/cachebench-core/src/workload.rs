//! Benchmark case runners.
//!
//! A case allocates its buffers, prefills them, runs one kernel (possibly
//! fanned out over workers), checks the result and tears everything down.
//! The returned [`CaseReport`] carries the wall-clock time of the kernel
//! call only; setup and verification are not timed.

use std::fmt;
use std::ops::Range;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::buffer::{Buffer, VECTOR_ALIGNMENT};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::kernels::mandelbrot::{render, render_partitioned, RenderMode, Viewport};
use crate::kernels::matmul::{multiply, multiply_parallel, MultiplyOrder};
use crate::kernels::scalar::{
    jump_increment, reverse_jump_increment, reverse_sequential_increment, sequential_increment,
};
use crate::kernels::vector::{simd_reverse_sequential_increment, simd_sequential_increment};
use crate::matrix::{DenseMatrix, FlatMatrix, RowMatrix};
use crate::partition;

type RangeKernel<T> = fn(&mut [T], Range<usize>, usize);

/// Order in which an array case visits its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// Ascending addresses.
    Sequential,
    /// Descending addresses.
    Reverse,
    /// Cache-line strided.
    Jump,
    /// Cache-line strided, descending.
    ReverseJump,
    /// Ascending, 256-bit.
    SimdSequential,
    /// Descending, 256-bit.
    SimdReverse,
    /// Worker `w` takes every `workers`-th element starting at `w`.
    Interleaved,
}

impl Traversal {
    /// Every traversal, in benchmark order.
    pub const ALL: [Self; 7] = [
        Self::Sequential,
        Self::Reverse,
        Self::Jump,
        Self::ReverseJump,
        Self::SimdSequential,
        Self::SimdReverse,
        Self::Interleaved,
    ];

    /// Name used in case names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Reverse => "reverse",
            Self::Jump => "jump",
            Self::ReverseJump => "reverse_jump",
            Self::SimdSequential => "simd_sequential",
            Self::SimdReverse => "simd_reverse",
            Self::Interleaved => "interleaved",
        }
    }

    /// Range kernel for the contiguous traversals; `None` for
    /// [`Interleaved`](Self::Interleaved).
    fn range_kernel<T: Element>(self) -> Option<RangeKernel<T>> {
        match self {
            Self::Sequential => Some(sequential_increment::<T>),
            Self::Reverse => Some(reverse_sequential_increment::<T>),
            Self::Jump => Some(jump_increment::<T>),
            Self::ReverseJump => Some(reverse_jump_increment::<T>),
            Self::SimdSequential => Some(simd_sequential_increment::<T>),
            Self::SimdReverse => Some(simd_reverse_sequential_increment::<T>),
            Self::Interleaved => None,
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Memory layout of the matrices in a matrix case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixLayout {
    /// One allocation per row ([`RowMatrix`]).
    Rows,
    /// One row-major allocation ([`FlatMatrix`]).
    Flat,
}

impl MatrixLayout {
    /// Name used in case names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rows => "rows",
            Self::Flat => "flat",
        }
    }
}

/// Outcome of one benchmark case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    /// Case name, e.g. `jump/int/100000/4t`.
    pub name: String,
    /// Element type name.
    pub element: String,
    /// Elements, matrix edge, or pixels.
    pub size: usize,
    /// Worker threads used.
    pub workers: usize,
    /// Wall-clock time of the kernel call.
    pub elapsed: Duration,
    /// Whether the result matched the expected values.
    pub verified: bool,
}

impl CaseReport {
    fn finish(
        name: String,
        element: &str,
        size: usize,
        workers: usize,
        elapsed: Duration,
        verified: bool,
    ) -> Self {
        tracing::info!(
            case = %name,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            size,
            workers,
            verified,
            "Benchmark case finished"
        );
        if !verified {
            tracing::warn!(case = %name, "Benchmark case produced unexpected values");
        }
        Self {
            name,
            element: element.to_string(),
            size,
            workers,
            elapsed,
            verified,
        }
    }
}

/// Runs one array traversal case over `len` elements of `T`.
///
/// The buffer is zeroed, traversed `passes` times, and every element is
/// checked to have been incremented exactly `passes` times. With
/// `workers > 1` the contiguous traversals are split with
/// [`partition::split_range`]; [`Traversal::Interleaved`] always fans out.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `len == 0` or `workers == 0`
/// - [`Error::OutOfMemory`] if the buffer cannot be allocated
pub fn run_array_case<T: Element>(
    traversal: Traversal,
    len: usize,
    workers: usize,
    passes: usize,
) -> Result<CaseReport> {
    if workers == 0 {
        return Err(Error::invalid("worker count must be > 0"));
    }
    let mut data = Buffer::<T>::allocate_aligned(len, VECTOR_ALIGNMENT)?;

    let start = Instant::now();
    match traversal.range_kernel::<T>() {
        Some(kernel) if workers == 1 => kernel(&mut data, 0..len, passes),
        Some(kernel) => partition::for_each_chunk(&mut data, 1, workers, |_, chunk| {
            kernel(chunk, 0..chunk.len(), passes);
        })?,
        None => partition::interleaved_increment(&mut data, workers, passes)?,
    }
    let elapsed = start.elapsed();

    let expected = (0..passes).fold(T::default(), |x, _| x.increment());
    let verified = data.iter().all(|&x| x == expected);

    let name = format!("{traversal}/{}/{len}/{workers}t", T::NAME);
    Ok(CaseReport::finish(name, T::NAME, len, workers, elapsed, verified))
}

/// Runs one `C += A * B` case on `n x n` matrices of `T`.
///
/// A and B are filled with `3`, C starts at zero; every cell of C must end
/// at `9 * n` (within a relative `n * f32::EPSILON` for floats).
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `n == 0` or `workers == 0`
/// - [`Error::OutOfMemory`] if any matrix cannot be allocated
pub fn run_matrix_case<T: Element>(
    layout: MatrixLayout,
    order: MultiplyOrder,
    n: usize,
    workers: usize,
) -> Result<CaseReport> {
    let (elapsed, verified) = match layout {
        MatrixLayout::Rows => time_multiply(RowMatrix::<T>::allocate, order, n, workers)?,
        MatrixLayout::Flat => time_multiply(FlatMatrix::<T>::allocate, order, n, workers)?,
    };
    let name = format!(
        "{}/{}/{}/{n}/{workers}t",
        order.name(),
        layout.name(),
        T::NAME
    );
    Ok(CaseReport::finish(name, T::NAME, n, workers, elapsed, verified))
}

// Reason: matrix edges are far below 2^52.
#[allow(clippy::cast_precision_loss)]
fn time_multiply<T, M, F>(
    allocate: F,
    order: MultiplyOrder,
    n: usize,
    workers: usize,
) -> Result<(Duration, bool)>
where
    T: Element,
    M: DenseMatrix<T>,
    F: Fn(usize) -> Result<M>,
{
    if workers == 0 {
        return Err(Error::invalid("worker count must be > 0"));
    }
    let three = T::from_u8(3);
    let mut a = allocate(n)?;
    let mut b = allocate(n)?;
    let mut c = allocate(n)?;
    a.fill(three);
    b.fill(three);

    let start = Instant::now();
    if workers == 1 {
        multiply(order, &a, &b, &mut c)?;
    } else {
        multiply_parallel(order, &a, &b, &mut c, workers)?;
    }
    let elapsed = start.elapsed();

    let expected = (0..n).fold(T::default(), |acc, _| acc.mul_add(three, three));
    let tolerance = n as f64 * f64::from(f32::EPSILON);
    let verified = (0..n).all(|i| {
        c.row(i)
            .iter()
            .all(|&x| x.approx_eq(expected, tolerance))
    });
    Ok((elapsed, verified))
}

/// Result of a Mandelbrot case: the report plus the iteration counts.
#[derive(Debug)]
pub struct MandelbrotRun {
    /// Timing and verification.
    pub report: CaseReport,
    /// Row-major counts, one per pixel.
    pub counts: Buffer<u32>,
}

/// Renders `viewport` once and returns the counts.
///
/// The counts are checked to lie in `0..=max_iterations`.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `workers == 0`
/// - [`Error::OutOfMemory`] if the count buffer cannot be allocated
pub fn run_mandelbrot_case(
    viewport: &Viewport,
    max_iterations: u32,
    mode: RenderMode,
    workers: usize,
) -> Result<MandelbrotRun> {
    if workers == 0 {
        return Err(Error::invalid("worker count must be > 0"));
    }
    let mut counts = Buffer::<u32>::allocate_aligned(viewport.pixels(), VECTOR_ALIGNMENT)?;

    let start = Instant::now();
    if workers == 1 {
        render(viewport, max_iterations, mode, &mut counts);
    } else {
        render_partitioned(viewport, max_iterations, mode, workers, &mut counts)?;
    }
    let elapsed = start.elapsed();

    let verified = counts.iter().all(|&c| c <= max_iterations);
    let mode_name = match mode {
        RenderMode::Scalar => "scalar",
        RenderMode::Vectorized => "vectorized",
    };
    let name = format!(
        "mandelbrot_{mode_name}/{}/{}x{}/{workers}t",
        viewport.label(),
        viewport.width(),
        viewport.height()
    );
    let report = CaseReport::finish(
        name,
        "double",
        viewport.pixels(),
        workers,
        elapsed,
        verified,
    );
    Ok(MandelbrotRun { report, counts })
}

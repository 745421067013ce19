//! Benchmark kernels: iteration, matrix multiply and Mandelbrot divergence.
//!
//! Kernels never allocate and never fail once their inputs are validated;
//! the result of a call is the mutated buffer or matrix.
//!
//! # Module Structure
//!
//! - `scalar`: Sequential, reverse, jump and reverse-jump increments
//! - `vector`: 256-bit sequential increments with scalar head/tail
//! - `matmul`: Naive, (i,k,j), blocked and vectorized `C += A * B`
//! - `mandelbrot`: Divergence kernels, viewport geometry and renderers
//! - `portable`: Lane-by-lane fallbacks with the AVX2 visiting order
//! - `x86_avx2`: AVX2/FMA kernel implementations (x86_64 only)
//! - `dispatch`: Runtime SIMD level detection and dispatch wiring
#![allow(clippy::cast_lossless)] // Numeric widening in SIMD kernels is intentional.

pub mod mandelbrot;
pub mod matmul;
pub mod scalar;
pub mod vector;

mod portable;

// =============================================================================
// Unsafe Invariants Reference
// =============================================================================
// SAFETY: Shared invariants for the unsafe blocks in this module tree.
// - Condition 1: Pointer arithmetic is derived from slice pointers with loop
//   bounds proving in-range access for each lane width.
// - Condition 2: Target-featured functions are called only after runtime
//   feature checks in `dispatch`.
// - Condition 3: Aligned loads/stores are used only on bodies produced by
//   `vector::split_aligned`; matrix row segments use `loadu`/`storeu`.
// - Condition 4: Concurrent writers into one matrix touch disjoint blocks
//   produced by `partition::split_matrix`.
// - Condition 5: `row_ptr` is trusted only through the `unsafe trait
//   DenseMatrix` contract (valid for `size()` writes, rows disjoint).

#[cfg(target_arch = "x86_64")]
mod x86_avx2;

pub(crate) mod dispatch;

pub use dispatch::{simd_level, SimdLevel};
pub use mandelbrot::{
    diverge, diverge_lanes, render, render_partitioned, render_rows, RenderMode, Viewport,
    MANDELBROT_LANES,
};
pub use matmul::{
    blocked_multiply, multiply, multiply_parallel, naive_multiply, optimized_multiply,
    simd_multiply, MultiplyOrder, BLOCK_EDGE,
};
pub use scalar::{
    jump_increment, jump_size, reverse_jump_increment, reverse_sequential_increment,
    sequential_increment, CACHE_LINE_BYTES,
};
pub use vector::{simd_reverse_sequential_increment, simd_sequential_increment};

// =============================================================================
// Tests (separate files per module)
// =============================================================================




#[cfg(test)]
mod mandelbrot_tests;

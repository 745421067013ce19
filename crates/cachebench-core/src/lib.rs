//! # cachebench core
//!
//! Kernels for measuring how memory-access order, threading and 256-bit SIMD
//! affect throughput.
//!
//! ## Features
//!
//! - **Array traversals**: sequential, reverse, cache-line "jump" and
//!   interleaved multi-threaded increments over aligned flat buffers
//! - **Matrix multiply**: naive, (i,k,j), blocked and vectorized orders over
//!   row-per-allocation and flat layouts, single-threaded or on a 2-D worker grid
//! - **Mandelbrot**: scalar and lane-masked AVX2 divergence kernels with
//!   identical results, row-partitioned rendering and PGM output
//!
//! ## Quick Start
//!
//! ```rust
//! use cachebench_core::kernels::{jump_increment, sequential_increment};
//! use cachebench_core::{Buffer, VECTOR_ALIGNMENT};
//!
//! let mut data = Buffer::<i32>::allocate_aligned(1000, VECTOR_ALIGNMENT)?;
//! sequential_increment(&mut data, 0..1000, 3);
//! jump_increment(&mut data, 0..1000, 2);
//! assert!(data.iter().all(|&x| x == 5));
//! # Ok::<(), cachebench_core::Error>(())
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::cast_lossless,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::manual_assert,
        clippy::float_cmp
    )
)]

pub mod alloc_guard;
pub mod buffer;
#[cfg(test)]
mod buffer_tests;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod element;
pub mod error;
pub mod image;
#[cfg(test)]
mod image_tests;
pub mod kernels;
pub mod matrix;
pub mod partition;
#[cfg(test)]
mod partition_tests;
pub mod workload;

pub use buffer::{Buffer, VECTOR_ALIGNMENT};
pub use config::BenchConfig;
pub use element::Element;
pub use error::{Error, Result};
pub use kernels::{simd_level, MultiplyOrder, RenderMode, SimdLevel, Viewport};
pub use matrix::{DenseMatrix, FlatMatrix, RowMatrix};
pub use partition::{split_matrix, split_range, Block};
pub use workload::{
    run_array_case, run_mandelbrot_case, run_matrix_case, CaseReport, MandelbrotRun,
    MatrixLayout, Traversal,
};

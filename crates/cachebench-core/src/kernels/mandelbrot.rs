//! Mandelbrot-set divergence kernels and renderers.
//!
//! A compute-bound floating-point stress test. Each pixel of a
//! [`Viewport`] maps to a point `c` of the complex plane; the kernel
//! iterates `z <- z^2 + c` from `z = 0` and records the iteration at which
//! the orbit leaves the square `[-2, 2] x [-2, 2]`.
//!
//! The escape test checks the real and imaginary parts independently
//! against ±2 instead of `|z|^2 > 4`. Points that never escape within the
//! cap are recorded as `0`; the image encoder relies on that convention.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::partition;

use super::dispatch;

/// Points evaluated per vectorized call (four `f64` per 256-bit register).
pub const MANDELBROT_LANES: usize = 4;

/// True while `z` stays inside the escape square.
///
/// Written as a conjunction of ordered comparisons so a NaN orbit counts as
/// escaped, matching the vector compare masks.
#[inline]
#[must_use]
pub(crate) fn in_bounds(re: f64, im: f64) -> bool {
    re <= 2.0 && re >= -2.0 && im <= 2.0 && im >= -2.0
}

/// Iteration count at which `c` escapes, or `0` if it stays bounded for
/// `max_iterations` iterations.
///
/// ```
/// use cachebench_core::kernels::mandelbrot::diverge;
///
/// assert_eq!(diverge(0.0, 0.0, 1500), 0);
/// assert_eq!(diverge(5.0, 5.0, 1500), 1);
/// ```
#[inline]
#[must_use]
pub fn diverge(c_re: f64, c_im: f64, max_iterations: u32) -> u32 {
    let (mut z_re, mut z_im) = (0.0_f64, 0.0_f64);
    for i in 1..=max_iterations {
        let next_re = z_re * z_re - z_im * z_im + c_re;
        let next_im = 2.0 * z_re * z_im + c_im;
        z_re = next_re;
        z_im = next_im;
        if !in_bounds(z_re, z_im) {
            return i;
        }
    }
    0
}

/// Vectorized [`diverge`] over [`MANDELBROT_LANES`] points sharing `c_im`.
///
/// Returns exactly the per-lane results of the scalar kernel.
#[inline]
#[must_use]
pub fn diverge_lanes(
    c_re: [f64; MANDELBROT_LANES],
    c_im: f64,
    max_iterations: u32,
) -> [u32; MANDELBROT_LANES] {
    dispatch::diverge_lanes(c_re, c_im, max_iterations)
}

/// Visible region of the complex plane and its pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    width: usize,
    height: usize,
    center_re: f64,
    center_im: f64,
    radius: f64,
}

impl Viewport {
    /// Creates a viewport of `width x height` pixels centred on
    /// `center_re + center_im*i`, showing `radius` on each side of the
    /// shorter dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a dimension is zero or the
    /// radius is not a positive finite number.
    pub fn new(
        width: usize,
        height: usize,
        center_re: f64,
        center_im: f64,
        radius: f64,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(format!(
                "viewport must be non-empty, got {width}x{height}"
            )));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(Error::invalid(format!(
                "viewport radius must be positive, got {radius}"
            )));
        }
        if !(center_re.is_finite() && center_im.is_finite()) {
            return Err(Error::invalid("viewport center must be finite"));
        }
        Ok(Self {
            width,
            height,
            center_re,
            center_im,
            radius,
        })
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    #[must_use]
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    /// Radius of the visible extent.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Distance between adjacent pixel centres: `2 * radius / min(width, height)`.
    // Reason: image dimensions are far below 2^53.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn pixel_width(&self) -> f64 {
        self.radius * 2.0 / self.width.min(self.height) as f64
    }

    /// Complex coordinate of pixel `(0, 0)`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn top_left(&self) -> (f64, f64) {
        let pw = self.pixel_width();
        (
            self.center_re - self.width as f64 / 2.0 * pw,
            self.center_im + self.height as f64 / 2.0 * pw,
        )
    }

    /// Complex coordinate of pixel `(row, col)`.
    ///
    /// Computed from the top-left corner by multiplication rather than
    /// accumulated stepping, so every renderer sees identical inputs.
    #[allow(clippy::cast_precision_loss)]
    #[inline]
    #[must_use]
    pub fn coordinate(&self, row: usize, col: usize) -> (f64, f64) {
        let pw = self.pixel_width();
        let (re0, im0) = self.top_left();
        (re0 + col as f64 * pw, im0 - row as f64 * pw)
    }

    /// Name of the well-known view with this radius, used in case and file names.
    #[must_use]
    pub fn label(&self) -> &'static str {
        const NAMED: [(f64, &str); 5] = [
            (1.0, "mandelbrot"),
            (0.000_25, "shells"),
            (0.000_4, "seastar"),
            (0.01, "stuff"),
            (0.000_000_003_5, "galaxy"),
        ];
        NAMED
            .iter()
            .find(|(radius, _)| (self.radius - radius).abs() <= radius * 1e-9)
            .map_or("custom", |(_, name)| name)
    }
}

/// How a row of pixels is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// One [`diverge`] call per pixel.
    Scalar,
    /// [`diverge_lanes`] over groups of four pixels, scalar for the remainder.
    Vectorized,
}

/// Renders rows `rows` of `viewport` into `out`, row-major, `width` counts per row.
///
/// # Panics
///
/// Panics if `out.len() != rows.len() * viewport.width()`.
pub fn render_rows(
    viewport: &Viewport,
    rows: Range<usize>,
    max_iterations: u32,
    mode: RenderMode,
    out: &mut [u32],
) {
    let width = viewport.width();
    assert_eq!(
        out.len(),
        rows.len() * width,
        "Output slice must hold exactly the requested rows"
    );

    for (row, line) in rows.zip(out.chunks_exact_mut(width)) {
        match mode {
            RenderMode::Scalar => render_line_scalar(viewport, row, max_iterations, line),
            RenderMode::Vectorized => render_line_vectorized(viewport, row, max_iterations, line),
        }
    }
}

fn render_line_scalar(viewport: &Viewport, row: usize, max_iterations: u32, line: &mut [u32]) {
    for (col, count) in line.iter_mut().enumerate() {
        let (re, im) = viewport.coordinate(row, col);
        *count = diverge(re, im, max_iterations);
    }
}

fn render_line_vectorized(viewport: &Viewport, row: usize, max_iterations: u32, line: &mut [u32]) {
    let (_, im) = viewport.coordinate(row, 0);
    let body = line.len() / MANDELBROT_LANES * MANDELBROT_LANES;

    for (group, counts) in line[..body].chunks_exact_mut(MANDELBROT_LANES).enumerate() {
        let base = group * MANDELBROT_LANES;
        let c_re = std::array::from_fn(|lane| viewport.coordinate(row, base + lane).0);
        counts.copy_from_slice(&diverge_lanes(c_re, im, max_iterations));
    }

    for (col, count) in line.iter_mut().enumerate().skip(body) {
        let (re, im) = viewport.coordinate(row, col);
        *count = diverge(re, im, max_iterations);
    }
}

/// Renders the whole viewport on the calling thread.
pub fn render(viewport: &Viewport, max_iterations: u32, mode: RenderMode, out: &mut [u32]) {
    render_rows(viewport, 0..viewport.height(), max_iterations, mode, out);
}

/// Renders the viewport with its rows split across `workers` threads.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `workers == 0` or `out` does not
/// hold exactly one count per pixel.
pub fn render_partitioned(
    viewport: &Viewport,
    max_iterations: u32,
    mode: RenderMode,
    workers: usize,
    out: &mut [u32],
) -> Result<()> {
    if out.len() != viewport.pixels() {
        return Err(Error::invalid(format!(
            "output holds {} counts, viewport has {} pixels",
            out.len(),
            viewport.pixels()
        )));
    }
    partition::for_each_chunk(out, viewport.width(), workers, |rows, chunk| {
        render_rows(viewport, rows, max_iterations, mode, chunk);
    })
}

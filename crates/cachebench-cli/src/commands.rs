//! Subcommand implementations.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cachebench_core::config::MandelbrotConfig;
use cachebench_core::image::save_pgm;
use cachebench_core::{
    run_array_case, run_mandelbrot_case, run_matrix_case, BenchConfig, CaseReport, MatrixLayout,
    MultiplyOrder, RenderMode, Traversal,
};

use crate::{ElementArg, LayoutArg, ModeArg, OrderArg, SectionArg, TraversalArg};

impl From<TraversalArg> for Traversal {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::Sequential => Self::Sequential,
            TraversalArg::Reverse => Self::Reverse,
            TraversalArg::Jump => Self::Jump,
            TraversalArg::ReverseJump => Self::ReverseJump,
            TraversalArg::SimdSequential => Self::SimdSequential,
            TraversalArg::SimdReverse => Self::SimdReverse,
            TraversalArg::Interleaved => Self::Interleaved,
        }
    }
}

impl From<OrderArg> for MultiplyOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Naive => Self::Naive,
            OrderArg::Optimized => Self::Optimized,
            OrderArg::Blocked => Self::Blocked,
            OrderArg::Vectorized => Self::Vectorized,
        }
    }
}

impl From<LayoutArg> for MatrixLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Rows => Self::Rows,
            LayoutArg::Flat => Self::Flat,
        }
    }
}

impl From<ModeArg> for RenderMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Scalar => Self::Scalar,
            ModeArg::Vectorized => Self::Vectorized,
        }
    }
}

const ELEMENTS: [ElementArg; 4] = [
    ElementArg::Int,
    ElementArg::Long,
    ElementArg::Float,
    ElementArg::Double,
];

/// Prints reports and counts the ones that failed verification.
pub(crate) struct Reporter {
    json: bool,
    total: usize,
    failed: usize,
}

impl Reporter {
    pub(crate) fn new(json: bool) -> Self {
        Self {
            json,
            total: 0,
            failed: 0,
        }
    }

    pub(crate) fn report(&mut self, report: &CaseReport) -> Result<()> {
        self.total += 1;
        if !report.verified {
            self.failed += 1;
        }

        let mut stdout = std::io::stdout().lock();
        if self.json {
            let line = serde_json::to_string(report).context("Failed to serialize report")?;
            writeln!(stdout, "{line}")?;
        } else {
            writeln!(
                stdout,
                "{:<48} {:>12.3} ms{}",
                report.name,
                report.elapsed.as_secs_f64() * 1e3,
                if report.verified { "" } else { "  FAILED" }
            )?;
        }
        Ok(())
    }

    /// Errors if any reported case failed verification.
    pub(crate) fn finish(self) -> Result<()> {
        if self.failed > 0 {
            bail!("{} of {} cases failed verification", self.failed, self.total);
        }
        Ok(())
    }
}

pub(crate) fn iterate(
    traversal: Traversal,
    element: ElementArg,
    size: usize,
    workers: usize,
    passes: usize,
) -> Result<CaseReport> {
    let report = match element {
        ElementArg::Int => run_array_case::<i32>(traversal, size, workers, passes),
        ElementArg::Long => run_array_case::<i64>(traversal, size, workers, passes),
        ElementArg::Float => run_array_case::<f32>(traversal, size, workers, passes),
        ElementArg::Double => run_array_case::<f64>(traversal, size, workers, passes),
    };
    report.with_context(|| format!("{traversal} over {size} elements failed"))
}

pub(crate) fn matmul(
    layout: MatrixLayout,
    order: MultiplyOrder,
    element: ElementArg,
    n: usize,
    workers: usize,
) -> Result<CaseReport> {
    let report = match element {
        ElementArg::Int => run_matrix_case::<i32>(layout, order, n, workers),
        ElementArg::Long => run_matrix_case::<i64>(layout, order, n, workers),
        ElementArg::Float => run_matrix_case::<f32>(layout, order, n, workers),
        ElementArg::Double => run_matrix_case::<f64>(layout, order, n, workers),
    };
    report.with_context(|| format!("{} multiply of {n}x{n} failed", order.name()))
}

pub(crate) fn mandelbrot(
    section: &MandelbrotConfig,
    mode: RenderMode,
    workers: usize,
    output: Option<&Path>,
) -> Result<CaseReport> {
    let viewport = section.viewport().context("Invalid Mandelbrot viewport")?;
    let run = run_mandelbrot_case(&viewport, section.max_iterations, mode, workers)
        .context("Mandelbrot render failed")?;

    if let Some(path) = output {
        save_pgm(
            path,
            viewport.width(),
            viewport.height(),
            &run.counts,
            section.max_iterations,
        )
        .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(run.report)
}

/// Runs the single-threaded cases of every configured size, then the
/// partitioned cases for every configured worker count.
pub(crate) fn suite(
    config: &BenchConfig,
    section: Option<SectionArg>,
    out: &mut Reporter,
) -> Result<()> {
    let wants = |s: SectionArg| section.is_none_or(|only| only == s);

    if wants(SectionArg::Iterate) {
        let it = &config.iterate;
        tracing::info!(sizes = it.sizes.len(), passes = it.passes, "Running array cases");
        for &size in &it.sizes {
            for element in ELEMENTS {
                for traversal in Traversal::ALL {
                    if traversal == Traversal::Interleaved {
                        continue;
                    }
                    out.report(&iterate(traversal, element, size, 1, it.passes)?)?;
                }
                for &workers in &it.workers {
                    for traversal in [Traversal::Sequential, Traversal::Interleaved] {
                        out.report(&iterate(traversal, element, size, workers, it.passes)?)?;
                    }
                }
            }
        }
    }

    if wants(SectionArg::Matrix) {
        let mx = &config.matrix;
        tracing::info!(sizes = mx.sizes.len(), "Running matrix cases");
        for &n in &mx.sizes {
            for layout in [MatrixLayout::Rows, MatrixLayout::Flat] {
                for order in MultiplyOrder::ALL {
                    out.report(&matmul(layout, order, ElementArg::Float, n, 1)?)?;
                }
            }
            for &workers in &mx.workers {
                out.report(&matmul(
                    MatrixLayout::Flat,
                    MultiplyOrder::Vectorized,
                    ElementArg::Float,
                    n,
                    workers,
                )?)?;
            }
        }
    }

    if wants(SectionArg::Mandelbrot) {
        let md = &config.mandelbrot;
        tracing::info!(width = md.width, height = md.height, "Running Mandelbrot cases");
        for mode in [RenderMode::Scalar, RenderMode::Vectorized] {
            out.report(&mandelbrot(md, mode, 1, None)?)?;
            for &workers in &md.workers {
                out.report(&mandelbrot(md, mode, workers, None)?)?;
            }
        }
    }
    Ok(())
}

//! cachebench - run array, matrix and Mandelbrot throughput cases.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cachebench_core::config::DEFAULT_CONFIG_FILE;
use cachebench_core::BenchConfig;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Memory-access and SIMD throughput benchmarks
#[derive(Parser, Debug)]
#[command(name = "cachebench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML). Missing files fall back to defaults.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "CACHEBENCH_CONFIG")]
    config: PathBuf,

    /// Print one JSON report per line instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Increment every element of a buffer `passes` times
    Iterate {
        /// Visiting order
        #[arg(short, long, value_enum, default_value = "sequential")]
        traversal: TraversalArg,

        /// Element type
        #[arg(short, long, value_enum, default_value = "int")]
        element: ElementArg,

        /// Buffer length in elements
        #[arg(short, long)]
        size: usize,

        /// Worker threads
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Passes over the buffer (defaults to `iterate.passes`)
        #[arg(short, long)]
        passes: Option<usize>,
    },

    /// Compute `C += A * B` on square matrices filled with 3
    Matmul {
        /// Loop order
        #[arg(short, long, value_enum, default_value = "optimized")]
        order: OrderArg,

        /// Memory layout
        #[arg(short, long, value_enum, default_value = "flat")]
        layout: LayoutArg,

        /// Element type
        #[arg(short, long, value_enum, default_value = "float")]
        element: ElementArg,

        /// Matrix edge length
        #[arg(short = 'n', long)]
        size: usize,

        /// Worker threads
        #[arg(short, long, default_value = "1")]
        workers: usize,
    },

    /// Render the Mandelbrot set described by the `mandelbrot` section
    Mandelbrot {
        /// Kernel
        #[arg(short, long, value_enum, default_value = "vectorized")]
        mode: ModeArg,

        /// Worker threads
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Image width (overrides `mandelbrot.width`)
        #[arg(long)]
        width: Option<usize>,

        /// Image height (overrides `mandelbrot.height`)
        #[arg(long)]
        height: Option<usize>,

        /// Half-extent of the shorter side (overrides `mandelbrot.radius`)
        #[arg(long)]
        radius: Option<f64>,

        /// Write the counts as a PGM image
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run every configured case of one or all sections
    Suite {
        /// Section to run; all when omitted
        #[arg(value_enum)]
        section: Option<SectionArg>,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Print the detected SIMD level
    Info,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub(crate) enum ElementArg {
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub(crate) enum TraversalArg {
    Sequential,
    Reverse,
    Jump,
    ReverseJump,
    SimdSequential,
    SimdReverse,
    Interleaved,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub(crate) enum OrderArg {
    Naive,
    Optimized,
    Blocked,
    Vectorized,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub(crate) enum LayoutArg {
    Rows,
    Flat,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub(crate) enum ModeArg {
    Scalar,
    Vectorized,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub(crate) enum SectionArg {
    Iterate,
    Matrix,
    Mandelbrot,
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = BenchConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    init_tracing(&config.logging.level);
    tracing::debug!(simd = ?cachebench_core::simd_level(), "Starting cachebench");

    let mut out = commands::Reporter::new(cli.json);
    match cli.command {
        Commands::Iterate {
            traversal,
            element,
            size,
            workers,
            passes,
        } => {
            let passes = passes.unwrap_or(config.iterate.passes);
            let report = commands::iterate(traversal.into(), element, size, workers, passes)?;
            out.report(&report)?;
        }
        Commands::Matmul {
            order,
            layout,
            element,
            size,
            workers,
        } => {
            let report = commands::matmul(layout.into(), order.into(), element, size, workers)?;
            out.report(&report)?;
        }
        Commands::Mandelbrot {
            mode,
            workers,
            width,
            height,
            radius,
            output,
        } => {
            let mut section = config.mandelbrot.clone();
            section.width = width.unwrap_or(section.width);
            section.height = height.unwrap_or(section.height);
            section.radius = radius.unwrap_or(section.radius);
            let report = commands::mandelbrot(&section, mode.into(), workers, output.as_deref())?;
            out.report(&report)?;
        }
        Commands::Suite { section } => {
            commands::suite(&config, section, &mut out)?;
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            return Ok(());
        }
        Commands::Info => {
            println!("simd: {:?}", cachebench_core::simd_level());
            return Ok(());
        }
    }

    out.finish()
}

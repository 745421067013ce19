//! Benchmark configuration.
//!
//! Layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`BenchConfig::default`])
//! 2. A TOML file (`cachebench.toml` unless another path is given)
//! 3. Environment variables prefixed `CACHEBENCH_`, nested keys split on
//!    `__` (e.g. `CACHEBENCH_MANDELBROT__MAX_ITERATIONS=500`)
//!
//! # Example file
//!
//! ```toml
//! [iterate]
//! passes = 1000
//! sizes = [1000, 100000]
//! workers = [2, 4]
//!
//! [mandelbrot]
//! width = 800
//! height = 600
//! radius = 0.01
//! ```

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::kernels::mandelbrot::Viewport;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "cachebench.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "CACHEBENCH_";

/// Array traversal cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterateConfig {
    /// Passes over the buffer per case.
    pub passes: usize,
    /// Buffer lengths, in elements.
    pub sizes: Vec<usize>,
    /// Worker counts for the partitioned cases.
    pub workers: Vec<usize>,
}

impl Default for IterateConfig {
    fn default() -> Self {
        Self {
            passes: 200_000,
            sizes: vec![10, 100, 1_000, 10_000, 100_000, 1_000_000, 2_000_000],
            workers: vec![2, 4, 8, 14],
        }
    }
}

/// Matrix multiply cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Matrix edge lengths.
    pub sizes: Vec<usize>,
    /// Worker counts for the partitioned cases.
    pub workers: Vec<usize>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            sizes: vec![512, 1024, 2048],
            workers: vec![2, 4, 8, 9, 16],
        }
    }
}

/// Mandelbrot rendering cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MandelbrotConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Real part of the view centre.
    pub center_re: f64,
    /// Imaginary part of the view centre.
    pub center_im: f64,
    /// Half-extent of the shorter image side.
    pub radius: f64,
    /// Iteration cap per pixel.
    pub max_iterations: u32,
    /// Worker counts for the partitioned cases.
    pub workers: Vec<usize>,
}

impl Default for MandelbrotConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            center_re: -0.5,
            center_im: 0.0,
            radius: 1.0,
            max_iterations: 1500,
            workers: vec![2, 4, 8, 14],
        }
    }
}

impl MandelbrotConfig {
    /// Viewport described by this section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty image or a
    /// non-positive radius.
    pub fn viewport(&self) -> Result<Viewport> {
        Viewport::new(
            self.width,
            self.height,
            self.center_re,
            self.center_im,
            self.radius,
        )
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete benchmark configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Array traversal cases.
    pub iterate: IterateConfig,
    /// Matrix multiply cases.
    pub matrix: MatrixConfig,
    /// Mandelbrot cases.
    pub mandelbrot: MandelbrotConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl BenchConfig {
    /// Loads `cachebench.toml` from the working directory (if present) and
    /// the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads defaults, then the TOML file at `path` (missing files are
    /// skipped), then the environment, and validates the result.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = Self::figment(path.as_ref()).extract()?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Parses a TOML document layered over the defaults, without the
    /// environment.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The provider stack used by [`load_from`](Self::load_from).
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Rejects values no benchmark case can run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        fn non_empty(key: &str, values: &[usize]) -> Result<()> {
            if values.is_empty() {
                return Err(Error::Config(format!("{key} must not be empty")));
            }
            if values.contains(&0) {
                return Err(Error::Config(format!("{key} must not contain 0")));
            }
            Ok(())
        }

        if self.iterate.passes == 0 {
            return Err(Error::Config("iterate.passes must be > 0".to_string()));
        }
        non_empty("iterate.sizes", &self.iterate.sizes)?;
        non_empty("iterate.workers", &self.iterate.workers)?;
        non_empty("matrix.sizes", &self.matrix.sizes)?;
        non_empty("matrix.workers", &self.matrix.workers)?;
        non_empty("mandelbrot.workers", &self.mandelbrot.workers)?;

        let m = &self.mandelbrot;
        if m.width == 0 || m.height == 0 {
            return Err(Error::Config(format!(
                "mandelbrot image must be non-empty, got {}x{}",
                m.width, m.height
            )));
        }
        if !(m.radius.is_finite() && m.radius > 0.0) {
            return Err(Error::Config(format!(
                "mandelbrot.radius must be positive, got {}",
                m.radius
            )));
        }
        if m.max_iterations == 0 {
            return Err(Error::Config(
                "mandelbrot.max_iterations must be > 0".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(Error::Config("logging.level must not be empty".to_string()));
        }
        Ok(())
    }
}

//! Error types for cachebench.

use thiserror::Error;

/// Errors raised while preparing or running a benchmark case.
///
/// Kernels themselves never fail: every variant here is produced either at
/// setup time (allocation, argument validation, configuration) or by the
/// image codec at teardown.
#[derive(Error, Debug)]
pub enum Error {
    /// The allocator returned no memory, or the requested size overflowed.
    #[error("Out of memory: failed to allocate {bytes} bytes")]
    OutOfMemory {
        /// Number of bytes that were requested (saturated on overflow).
        bytes: usize,
    },

    /// Caller error: zero workers, zero-sized buffer, mismatched shapes.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed PGM image header or payload.
    #[error("Image error: {0}")]
    Image(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for cachebench operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for perf_io.

use perf_core::PerfCoreError;
use thiserror::Error;

/// Errors that can occur while writing figures or loss archives.
#[derive(Error, Debug)]
pub enum PerfIoError {
    /// Images of a triplet do not share a shape.
    #[error("shape mismatch: {what} has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Which image disagreed.
        what: &'static str,
        /// Shape of the input image.
        expected: Vec<usize>,
        /// Shape of the offending image.
        got: Vec<usize>,
    },

    /// Input data cannot be rendered with the current configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The plotting backend failed.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the loss archive failed.
    #[error("failed to write npz archive: {0}")]
    NpzWrite(#[from] ndarray_npy::WriteNpzError),

    /// Reading the loss archive failed.
    #[error("failed to read npz archive: {0}")]
    NpzRead(#[from] ndarray_npy::ReadNpzError),

    /// Numerical error from perf_core.
    #[error(transparent)]
    Core(#[from] PerfCoreError),
}

/// Result type for perf_io operations.
pub type Result<T> = std::result::Result<T, PerfIoError>;

/// Convert a plotters error into [`PerfIoError::Render`].
pub(crate) fn render_err(err: impl std::fmt::Display) -> PerfIoError {
    PerfIoError::Render(err.to_string())
}

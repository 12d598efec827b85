//! Error types for neural_perf.

use std::path::PathBuf;

use perf_core::PerfCoreError;
use perf_io::PerfIoError;
use thiserror::Error;

/// Errors that can occur while building, loading or running generators.
#[derive(Error, Debug)]
pub enum NeuralPerfError {
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Filesystem error on a checkpoint path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A checkpoint could not be encoded or decoded.
    #[error("checkpoint {}: {message}", path.display())]
    Checkpoint {
        /// Checkpoint file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Stored weights do not fit the network they are loaded into.
    #[error("state mismatch: {0}")]
    StateMismatch(String),

    /// Tensor data could not be converted.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Writing figures failed.
    #[error(transparent)]
    Figures(#[from] PerfIoError),

    /// Numerical error from perf_core.
    #[error(transparent)]
    Core(#[from] PerfCoreError),
}

impl NeuralPerfError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NeuralPerfError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        NeuralPerfError::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for neural_perf operations.
pub type Result<T> = std::result::Result<T, NeuralPerfError>;

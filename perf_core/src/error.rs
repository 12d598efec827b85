//! Error types for perf_core.

use thiserror::Error;

/// Errors that can occur during metric and resampling operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerfCoreError {
    /// Two arrays that must agree in shape do not.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Shape of the reference array.
        expected: Vec<usize>,
        /// Shape of the offending array.
        got: Vec<usize>,
    },

    /// An operation that averages over elements received none.
    #[error("empty input: {what} has no elements")]
    EmptyInput {
        /// Which input was empty.
        what: &'static str,
    },

    /// A target grid shape contains a zero-length axis.
    #[error("invalid target shape {shape:?}: every axis must be positive")]
    InvalidShape {
        /// The rejected shape.
        shape: Vec<usize>,
    },

    /// Volume data has a rank other than 3 or 4.
    #[error("unsupported volume rank {rank}: expected 3 or 4")]
    UnsupportedRank {
        /// Rank of the supplied data array.
        rank: usize,
    },

    /// The voxel-to-world affine cannot be inverted.
    #[error("affine is singular and cannot be inverted")]
    SingularAffine,

    /// Voxel spacing does not match the volume rank or is not positive.
    #[error("invalid voxel spacing {zooms:?} for rank {rank}")]
    InvalidZooms {
        /// The rejected spacing.
        zooms: Vec<f64>,
        /// Rank of the volume it was attached to.
        rank: usize,
    },
}

/// Result type for perf_core operations.
pub type Result<T> = std::result::Result<T, PerfCoreError>;

//! # perf_core
//!
//! Pure numerical routines for evaluating perfusion (DSC-perf) image
//! generators.
//!
//! This crate has no knowledge of networks, files or plotting. It provides
//! the arithmetic that the I/O and neural crates build on.
//!
//! ## Modules
//!
//! - [`metrics`]: Mean absolute error between equally-shaped arrays
//! - [`affine`]: Voxel-to-world transforms, voxel sizes and affine rescaling
//! - [`volume`]: 3D / 4D volumes with affine and spacing metadata
//! - [`resample`]: Resampling onto new voxel grids with preserved field of view
//! - [`error`]: Error types
//!
//! ## Usage
//!
//! ```
//! use ndarray::Array3;
//! use perf_core::prelude::*;
//!
//! let volume = Volume::from_array3(Array3::ones((64, 64, 64)), Affine::identity());
//! let resized = resize_img(&volume, [32, 32, 32]).unwrap();
//!
//! assert_eq!(resized.shape(), &[32, 32, 32]);
//! assert_eq!(resized.spatial_zooms(), [2.0, 2.0, 2.0]);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` (default): Resample voxels on the rayon thread pool

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod affine;
pub mod error;
pub mod metrics;
pub mod resample;
pub mod volume;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::affine::{rescale_affine, Affine};
    pub use crate::error::{PerfCoreError, Result};
    pub use crate::metrics::mae;
    pub use crate::resample::{resample_from_to, resize_img, resize_img_with, Interpolation};
    pub use crate::volume::{GridSpec, Volume};
}

pub use affine::{rescale_affine, Affine};
pub use error::{PerfCoreError, Result};
pub use metrics::mae;
pub use resample::{resample_from_to, resize_img, resize_img_with, Interpolation};
pub use volume::{GridSpec, Volume};

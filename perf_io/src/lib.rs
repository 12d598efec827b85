//! # perf_io
//!
//! Diagnostic output for perfusion generator evaluation: image panel
//! figures, loss curves and the compressed loss archive.
//!
//! ## Modules
//!
//! - [`figures`]: [`save_figs`] and [`FigureWriter`]
//! - [`archive`]: [`LossHistory`], [`save_losses`], [`load_losses`]
//! - [`colormap`]: Scalar-to-colour maps for image panels
//! - [`config`]: [`FigureConfig`] layout parameters
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```no_run
//! use ndarray::Array4;
//! use perf_io::prelude::*;
//!
//! let batch = Array4::<f32>::zeros((2, 1, 64, 64));
//! let images = ImageTriplet::batch(batch.view(), batch.view(), batch.view());
//! let losses = LossHistory::new(vec![0.7, 0.6], vec![1.3, 1.1], vec![0.2, 0.18]);
//!
//! let paths = save_figs(2, &images, &losses, "figures/trial1_", &FigureConfig::new(2)).unwrap();
//! assert!(paths.archive.ends_with("trial1_losses.npz"));
//! ```
//!
//! Titles and axis labels are drawn with a bundled copy of DejaVu Sans, so
//! rendering does not depend on the fonts installed on the host.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod colormap;
pub mod config;
pub mod error;
pub mod figures;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::archive::{load_losses, save_losses, LossHistory};
    pub use crate::colormap::Colormap;
    pub use crate::config::FigureConfig;
    pub use crate::error::{PerfIoError, Result};
    pub use crate::figures::{save_figs, FigurePaths, FigureWriter, ImageTriplet};
}

pub use archive::{archive_path, load_losses, save_losses, LossHistory};
pub use colormap::Colormap;
pub use config::FigureConfig;
pub use error::{PerfIoError, Result};
pub use figures::{save_figs, FigurePaths, FigureWriter, ImageTriplet};

//! # neural_perf
//!
//! Generator networks, checkpoint restoration and device placement for
//! evaluating perfusion GANs with Burn.
//!
//! ## Features
//!
//! - **Generators**: [`UnetGenerator`] (frames stacked as channels) and
//!   [`TmpAndUnet`] (temporal 3D stem feeding a U-Net)
//! - **Checkpoints**: weights, Adam state and hyperparameters in one record
//! - **Loader**: [`load_g`] rebuilds a network, restores its state and
//!   replicates it across devices when requested
//! - **Reports**: panel figures straight from generator tensors
//!
//! ## Quick Start
//!
//! ```ignore
//! use burn::backend::{Autodiff, NdArray};
//! use neural_perf::prelude::*;
//!
//! type MyBackend = Autodiff<NdArray>;
//!
//! let config = EvalConfig::new("/data/runs".to_string());
//! let arch = GeneratorConfig::new().with_norm_layer("instancenorm".parse()?);
//!
//! let loaded = load_g::<MyBackend>(&config, 12, 150, GeneratorKind::Unet, &arch)?;
//! println!("lr_g = {}", loaded.hyperparams().lr_g);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! perf_core (metrics, resampling)
//!     │
//!     ├──────────────────┐
//!     ▼                  ▼
//! perf_io          neural_perf
//! (figures)  ◄──── (networks, checkpoints)
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `ndarray` (default): CPU backend using ndarray
//! - `wgpu`: GPU acceleration via WebGPU

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod config;
pub mod device;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod nn;
pub mod parallel;
pub mod report;

pub use checkpoint::{
    checkpoint_path, load_checkpoint, save_checkpoint, CheckpointHyperparams, GeneratorCheckpoint,
    GeneratorOptimizer,
};
pub use config::{EvalConfig, GeneratorConfig, GeneratorKind, NormLayer};
pub use device::DeviceIndex;
pub use error::{NeuralPerfError, Result};
pub use loader::{load_g, load_generator, AnyGenerator, LoadedGenerator};
pub use nn::{GeneratorNetwork, TmpAndUnet, UnetGenerator};
pub use parallel::{DataParallel, GeneratorHandle};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::checkpoint::{
        checkpoint_path, find_latest_epoch, load_checkpoint, save_checkpoint,
        CheckpointHyperparams, GeneratorCheckpoint, GeneratorOptimizer,
    };
    pub use crate::config::{EvalConfig, GeneratorConfig, GeneratorKind, NormLayer};
    pub use crate::device::DeviceIndex;
    pub use crate::error::{NeuralPerfError, Result};
    pub use crate::loader::{load_g, load_generator, param_shapes, AnyGenerator, LoadedGenerator};
    pub use crate::metrics::{mae_tensor, tensor_to_array4};
    pub use crate::nn::{GeneratorNetwork, Norm, TmpAndUnet, UnetGenerator};
    pub use crate::parallel::{DataParallel, GeneratorHandle};
    pub use crate::report::save_generated_figs;
}

//! Evaluation run configuration.

use std::path::PathBuf;

use burn::config::Config;
use perf_io::FigureConfig;

use crate::checkpoint::checkpoint_path;
use crate::device::DeviceIndex;

/// Settings shared by the loader and the figure writer of one evaluation
/// run. Passed explicitly to every operation that needs it.
#[derive(Config, Debug)]
pub struct EvalConfig {
    /// Directory holding `models/DSC-perf/Trial_<trial>/`.
    pub root_path: String,

    /// Batch samples rendered per panel figure.
    #[config(default = 4)]
    pub nr_imgs_gen: usize,

    /// Place networks on accelerator devices.
    #[config(default = false)]
    pub use_gpu: bool,

    /// Number of devices; more than one enables data parallelism.
    #[config(default = 1)]
    pub nr_gpus: usize,

    /// Device indices used for placement. The first entry is the primary
    /// device. Empty means `0..nr_gpus`.
    #[config(default = "vec![0]")]
    pub gpu_idx: Vec<usize>,
}

impl EvalConfig {
    /// Checkpoint file of `trial` at `epoch` under this run's root.
    pub fn checkpoint_path(&self, trial: impl std::fmt::Display, epoch: usize) -> PathBuf {
        checkpoint_path(&self.root_path, trial, epoch)
    }

    /// Device indices in placement order.
    pub fn device_indices(&self) -> Vec<usize> {
        if self.gpu_idx.is_empty() {
            (0..self.nr_gpus.max(1)).collect()
        } else {
            self.gpu_idx.clone()
        }
    }

    /// Whether networks should be replicated across devices.
    pub fn wants_data_parallel(&self) -> bool {
        self.use_gpu && self.nr_gpus > 1
    }

    /// Device every network is built on.
    ///
    /// The first configured index when `use_gpu` is set, the backend default
    /// otherwise.
    pub fn primary_device<B: DeviceIndex>(&self) -> B::Device {
        if self.use_gpu {
            B::device_at(self.device_indices()[0])
        } else {
            B::Device::default()
        }
    }

    /// All devices a data-parallel wrapper replicates onto, primary first.
    pub fn devices<B: DeviceIndex>(&self) -> Vec<B::Device> {
        if !self.use_gpu {
            return vec![B::Device::default()];
        }
        self.device_indices().into_iter().map(B::device_at).collect()
    }

    /// Figure layout matching this run.
    pub fn figure_config(&self) -> FigureConfig {
        FigureConfig::new(self.nr_imgs_gen)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.root_path.is_empty() {
            return Err("root_path must not be empty".to_string());
        }
        if self.nr_imgs_gen == 0 {
            return Err("nr_imgs_gen must be positive".to_string());
        }
        if self.use_gpu && self.nr_gpus == 0 {
            return Err("nr_gpus must be positive when use_gpu is set".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvalConfig::new("/data/".to_string());
        assert_eq!(config.nr_imgs_gen, 4);
        assert!(!config.use_gpu);
        assert_eq!(config.nr_gpus, 1);
        assert_eq!(config.gpu_idx, vec![0]);
        assert!(config.validate().is_ok());
        assert!(!config.wants_data_parallel());
    }

    #[test]
    fn test_device_indices() {
        let config = EvalConfig::new("r".to_string()).with_gpu_idx(vec![2, 3]);
        assert_eq!(config.device_indices(), vec![2, 3]);

        let config = config.with_gpu_idx(vec![]).with_nr_gpus(3);
        assert_eq!(config.device_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_data_parallel_needs_gpu_and_several_devices() {
        let config = EvalConfig::new("r".to_string()).with_nr_gpus(2);
        assert!(!config.wants_data_parallel());
        assert!(config.with_use_gpu(true).wants_data_parallel());
    }

    #[test]
    fn test_checkpoint_path() {
        let config = EvalConfig::new("/runs".to_string());
        assert_eq!(
            config.checkpoint_path(12, 40),
            PathBuf::from("/runs/models/DSC-perf/Trial_12/epoch40.pth")
        );
    }

    #[test]
    fn test_figure_config_follows_rows() {
        let config = EvalConfig::new("r".to_string()).with_nr_imgs_gen(2);
        assert_eq!(config.figure_config().nr_imgs_gen, 2);
    }

    #[test]
    fn test_validate() {
        assert!(EvalConfig::new(String::new()).validate().is_err());
        assert!(EvalConfig::new("r".to_string())
            .with_nr_imgs_gen(0)
            .validate()
            .is_err());
        assert!(EvalConfig::new("r".to_string())
            .with_use_gpu(true)
            .with_nr_gpus(0)
            .validate()
            .is_err());
    }
}

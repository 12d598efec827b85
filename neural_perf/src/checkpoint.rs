//! Generator checkpoint files.
//!
//! A checkpoint stores the generator weights, the state of its Adam
//! optimizer and the optimizer hyperparameters under the keys `lr_g`,
//! `beta1_g`, `beta2_g`, `generator_state_dict` and `gen_opt_state_dict`.
//! Files live at `<root>/models/DSC-perf/Trial_<trial>/epoch<epoch>.pth` and
//! are encoded with burn's named MessagePack recorder at full precision.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use burn::module::{AutodiffModule, Module};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, Optimizer};
use burn::record::{
    FullPrecisionSettings, NamedMpkBytesRecorder, PrecisionSettings, Record, Recorder,
};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::error::{NeuralPerfError, Result};

/// Directory under the root that holds all trials.
pub const MODELS_DIR: &str = "models/DSC-perf";

/// Adam optimizer over the parameters of generator `G`.
pub type GeneratorOptimizer<B, G> = OptimizerAdaptor<Adam, G, B>;

/// Persisted state of a [`GeneratorOptimizer`].
pub type OptimizerRecord<B, G> = <GeneratorOptimizer<B, G> as Optimizer<G, B>>::Record;

type CheckpointRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// Adam hyperparameters stored alongside the weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointHyperparams {
    /// Generator learning rate.
    pub lr_g: f64,
    /// First-moment decay.
    pub beta1_g: f32,
    /// Second-moment decay.
    pub beta2_g: f32,
}

/// Everything saved for a generator at the end of an epoch.
pub struct GeneratorCheckpoint<B: AutodiffBackend, G: AutodiffModule<B>> {
    /// Generator learning rate.
    pub lr_g: f64,
    /// Adam first-moment decay.
    pub beta1_g: f32,
    /// Adam second-moment decay.
    pub beta2_g: f32,
    /// Generator weights.
    pub generator_state_dict: G::Record,
    /// Optimizer state.
    pub gen_opt_state_dict: OptimizerRecord<B, G>,
}

impl<B: AutodiffBackend, G: AutodiffModule<B>> GeneratorCheckpoint<B, G> {
    /// Snapshot a generator and its optimizer.
    pub fn new(
        hyperparams: CheckpointHyperparams,
        generator: &G,
        optimizer: &GeneratorOptimizer<B, G>,
    ) -> Self {
        Self {
            lr_g: hyperparams.lr_g,
            beta1_g: hyperparams.beta1_g,
            beta2_g: hyperparams.beta2_g,
            generator_state_dict: generator.clone().into_record(),
            gen_opt_state_dict: optimizer.to_record(),
        }
    }

    /// The stored optimizer hyperparameters.
    pub fn hyperparams(&self) -> CheckpointHyperparams {
        CheckpointHyperparams {
            lr_g: self.lr_g,
            beta1_g: self.beta1_g,
            beta2_g: self.beta2_g,
        }
    }
}

/// Serialized form of [`GeneratorCheckpoint`].
#[derive(Serialize, Deserialize, Clone)]
pub struct GeneratorCheckpointItem<GI, OI> {
    lr_g: f64,
    beta1_g: f32,
    beta2_g: f32,
    generator_state_dict: GI,
    gen_opt_state_dict: OI,
}

impl<B, G> Record<B> for GeneratorCheckpoint<B, G>
where
    B: AutodiffBackend,
    G: AutodiffModule<B>,
{
    type Item<S: PrecisionSettings> = GeneratorCheckpointItem<
        <G::Record as Record<B>>::Item<S>,
        <OptimizerRecord<B, G> as Record<B>>::Item<S>,
    >;

    fn into_item<S: PrecisionSettings>(self) -> Self::Item<S> {
        GeneratorCheckpointItem {
            lr_g: self.lr_g,
            beta1_g: self.beta1_g,
            beta2_g: self.beta2_g,
            generator_state_dict: self.generator_state_dict.into_item::<S>(),
            gen_opt_state_dict: self.gen_opt_state_dict.into_item::<S>(),
        }
    }

    fn from_item<S: PrecisionSettings>(item: Self::Item<S>, device: &B::Device) -> Self {
        Self {
            lr_g: item.lr_g,
            beta1_g: item.beta1_g,
            beta2_g: item.beta2_g,
            generator_state_dict: <G::Record as Record<B>>::from_item::<S>(
                item.generator_state_dict,
                device,
            ),
            gen_opt_state_dict: <OptimizerRecord<B, G> as Record<B>>::from_item::<S>(
                item.gen_opt_state_dict,
                device,
            ),
        }
    }
}

/// Path of the checkpoint for `trial` at `epoch` under `root`.
pub fn checkpoint_path(root: impl AsRef<Path>, trial: impl Display, epoch: usize) -> PathBuf {
    trial_dir(root, trial).join(format!("epoch{epoch}.pth"))
}

/// Directory holding all checkpoints of `trial`.
pub fn trial_dir(root: impl AsRef<Path>, trial: impl Display) -> PathBuf {
    root.as_ref().join(MODELS_DIR).join(format!("Trial_{trial}"))
}

/// Write `checkpoint` to `path`, creating parent directories.
pub fn save_checkpoint<B, G>(
    path: impl AsRef<Path>,
    checkpoint: GeneratorCheckpoint<B, G>,
) -> Result<()>
where
    B: AutodiffBackend,
    G: AutodiffModule<B>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| NeuralPerfError::io(parent, e))?;
    }

    let recorder = CheckpointRecorder::new();
    let bytes = Recorder::<B>::record(&recorder, checkpoint, ()).map_err(|e| {
        NeuralPerfError::Checkpoint {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    fs::write(path, &bytes).map_err(|e| NeuralPerfError::io(path, e))?;

    log::info!("saved checkpoint {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read a checkpoint from `path`, placing its tensors on `device`.
pub fn load_checkpoint<B, G>(
    path: impl AsRef<Path>,
    device: &B::Device,
) -> Result<GeneratorCheckpoint<B, G>>
where
    B: AutodiffBackend,
    G: AutodiffModule<B>,
{
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| NeuralPerfError::io(path, e))?;

    let recorder = CheckpointRecorder::new();
    let checkpoint = Recorder::<B>::load(&recorder, bytes, device).map_err(|e| {
        NeuralPerfError::Checkpoint {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("loaded checkpoint {}", path.display());
    Ok(checkpoint)
}

/// Highest epoch with a checkpoint in `trial`, if any.
pub fn find_latest_epoch(root: impl AsRef<Path>, trial: impl Display) -> Result<Option<usize>> {
    let dir = trial_dir(root, trial);
    if !dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(&dir).map_err(|e| NeuralPerfError::io(&dir, e))?;
    let mut latest = None;
    for entry in entries {
        let entry = entry.map_err(|e| NeuralPerfError::io(&dir, e))?;
        let name = entry.file_name();
        let epoch = name
            .to_str()
            .and_then(|name| name.strip_prefix("epoch"))
            .and_then(|rest| rest.strip_suffix(".pth"))
            .and_then(|digits| digits.parse::<usize>().ok());
        if let Some(epoch) = epoch {
            latest = latest.max(Some(epoch));
        }
    }
    Ok(latest)
}

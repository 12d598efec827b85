//! Restore a trained generator and its optimizer from a checkpoint.
//!
//! [`load_generator`] is the typed entry point for a known architecture;
//! [`load_g`] selects the architecture at runtime from a [`GeneratorKind`].

use std::fmt::Display;

use burn::module::{AutodiffModule, Module, ModuleVisitor, ParamId};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use crate::checkpoint::{load_checkpoint, CheckpointHyperparams, GeneratorOptimizer};
use crate::config::{EvalConfig, GeneratorConfig, GeneratorKind};
use crate::device::DeviceIndex;
use crate::error::{NeuralPerfError, Result};
use crate::nn::{GeneratorNetwork, TmpAndUnet, UnetGenerator};
use crate::parallel::{DataParallel, GeneratorHandle};

/// Adam epsilon used when rebuilding the optimizer.
pub const ADAM_EPSILON: f32 = 0.0;

/// A generator restored from a checkpoint.
pub struct LoadedGenerator<B: AutodiffBackend, G: AutodiffModule<B>> {
    /// The network, replicated when data parallelism was requested.
    pub generator: GeneratorHandle<B, G>,
    /// Adam optimizer with its restored state. [`LoadedGenerator::step`]
    /// drives it with the checkpoint's `lr_g`.
    pub optimizer: GeneratorOptimizer<B, G>,
    /// Hyperparameters stored in the checkpoint.
    pub hyperparams: CheckpointHyperparams,
}

impl<B: AutodiffBackend, G: AutodiffModule<B>> LoadedGenerator<B, G> {
    /// The underlying network.
    pub fn module(&self) -> &G {
        self.generator.module()
    }

    /// Generator learning rate stored in the checkpoint.
    pub fn learning_rate(&self) -> f64 {
        self.hyperparams.lr_g
    }

    /// Apply one Adam update at [`Self::learning_rate`].
    ///
    /// `grads` are taken with respect to [`Self::module`]. A data-parallel
    /// generator is replicated again after the update.
    pub fn step(self, grads: GradientsParams) -> Self {
        let Self {
            generator,
            mut optimizer,
            hyperparams,
        } = self;
        let generator =
            generator.map_module(|module| optimizer.step(hyperparams.lr_g, module, grads));
        Self {
            generator,
            optimizer,
            hyperparams,
        }
    }
}

/// Load the generator of `trial` at `epoch` for a statically known
/// architecture.
///
/// The network is built from `gen_config` on the primary device of
/// `config`, then its weights and the Adam state are restored from
/// `<root>/models/DSC-perf/Trial_<trial>/epoch<epoch>.pth`. Adam betas come
/// from the checkpoint; epsilon is [`ADAM_EPSILON`].
pub fn load_generator<B, G, const D: usize>(
    config: &EvalConfig,
    trial: impl Display,
    epoch: usize,
    gen_config: &GeneratorConfig,
) -> Result<LoadedGenerator<B, G>>
where
    B: AutodiffBackend + DeviceIndex,
    G: AutodiffModule<B> + GeneratorNetwork<B, D>,
{
    config.validate().map_err(NeuralPerfError::config)?;
    gen_config.validate().map_err(NeuralPerfError::config)?;

    let device = config.primary_device::<B>();
    let generator = G::build(gen_config, &device);

    let path = config.checkpoint_path(&trial, epoch);
    let checkpoint = load_checkpoint::<B, G>(&path, &device)?;
    let hyperparams = checkpoint.hyperparams();

    let optimizer = AdamConfig::new()
        .with_beta_1(hyperparams.beta1_g)
        .with_beta_2(hyperparams.beta2_g)
        .with_epsilon(ADAM_EPSILON)
        .init::<B, G>();

    generator.check_record(&checkpoint.generator_state_dict)?;
    let expected = param_shapes(&generator);
    let generator = generator.load_record(checkpoint.generator_state_dict);
    let restored = param_shapes(&generator);
    compare_param_shapes(&expected, &restored)?;

    let optimizer = optimizer.load_record(checkpoint.gen_opt_state_dict);

    let generator = wrap_for_devices(config, generator);

    log::info!(
        "loaded {} generator for trial {} epoch {} ({} parameters, lr_g={}, parallel={})",
        G::KIND,
        trial,
        epoch,
        generator.module().num_params(),
        hyperparams.lr_g,
        generator.is_parallel(),
    );

    Ok(LoadedGenerator {
        generator,
        optimizer,
        hyperparams,
    })
}

fn wrap_for_devices<B, G>(config: &EvalConfig, generator: G) -> GeneratorHandle<B, G>
where
    B: AutodiffBackend + DeviceIndex,
    G: AutodiffModule<B>,
{
    if !config.wants_data_parallel() {
        return GeneratorHandle::Single(generator);
    }

    let devices = config.devices::<B>();
    if devices.len() < 2 {
        log::warn!(
            "nr_gpus={} but only {} device index configured; running on one device",
            config.nr_gpus,
            devices.len()
        );
        return GeneratorHandle::Single(generator);
    }

    match DataParallel::new(generator.clone(), devices) {
        Some(parallel) => GeneratorHandle::Parallel(parallel),
        None => GeneratorHandle::Single(generator),
    }
}

/// A loaded generator of either architecture.
pub enum AnyGenerator<B: AutodiffBackend + DeviceIndex> {
    /// Stacked-frame U-Net.
    Unet(LoadedGenerator<B, UnetGenerator<B>>),
    /// Temporal stem followed by a U-Net.
    TmpAndUnet(LoadedGenerator<B, TmpAndUnet<B>>),
}

impl<B: AutodiffBackend + DeviceIndex> AnyGenerator<B> {
    /// Architecture variant.
    pub fn kind(&self) -> GeneratorKind {
        match self {
            AnyGenerator::Unet(_) => GeneratorKind::Unet,
            AnyGenerator::TmpAndUnet(_) => GeneratorKind::TmpAndUnet,
        }
    }

    /// Hyperparameters stored in the checkpoint.
    pub fn hyperparams(&self) -> CheckpointHyperparams {
        match self {
            AnyGenerator::Unet(loaded) => loaded.hyperparams,
            AnyGenerator::TmpAndUnet(loaded) => loaded.hyperparams,
        }
    }

    /// Whether the network is replicated across devices.
    pub fn is_parallel(&self) -> bool {
        match self {
            AnyGenerator::Unet(loaded) => loaded.generator.is_parallel(),
            AnyGenerator::TmpAndUnet(loaded) => loaded.generator.is_parallel(),
        }
    }

    /// The U-Net variant, if loaded.
    pub fn as_unet(&self) -> Option<&LoadedGenerator<B, UnetGenerator<B>>> {
        match self {
            AnyGenerator::Unet(loaded) => Some(loaded),
            AnyGenerator::TmpAndUnet(_) => None,
        }
    }

    /// The temporal-stem variant, if loaded.
    pub fn as_tmp_and_unet(&self) -> Option<&LoadedGenerator<B, TmpAndUnet<B>>> {
        match self {
            AnyGenerator::TmpAndUnet(loaded) => Some(loaded),
            AnyGenerator::Unet(_) => None,
        }
    }
}

/// Load the generator of `trial` at `epoch`, choosing the architecture at
/// runtime.
///
/// See [`load_generator`].
pub fn load_g<B>(
    config: &EvalConfig,
    trial: impl Display,
    epoch: usize,
    kind: GeneratorKind,
    gen_config: &GeneratorConfig,
) -> Result<AnyGenerator<B>>
where
    B: AutodiffBackend + DeviceIndex,
{
    match kind {
        GeneratorKind::Unet => {
            load_generator::<B, UnetGenerator<B>, 4>(config, trial, epoch, gen_config)
                .map(AnyGenerator::Unet)
        }
        GeneratorKind::TmpAndUnet => {
            load_generator::<B, TmpAndUnet<B>, 5>(config, trial, epoch, gen_config)
                .map(AnyGenerator::TmpAndUnet)
        }
    }
}

/// Shapes of every float tensor of `module`, in visiting order.
pub fn param_shapes<B: Backend, M: Module<B>>(module: &M) -> Vec<Vec<usize>> {
    let mut visitor = ParamShapes { shapes: Vec::new() };
    module.visit(&mut visitor);
    visitor.shapes
}

struct ParamShapes {
    shapes: Vec<Vec<usize>>,
}

impl<B: Backend> ModuleVisitor<B> for ParamShapes {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        self.shapes.push(tensor.dims().to_vec());
    }
}

fn compare_param_shapes(expected: &[Vec<usize>], got: &[Vec<usize>]) -> Result<()> {
    if expected.len() != got.len() {
        return Err(NeuralPerfError::StateMismatch(format!(
            "network has {} parameter tensors but the checkpoint has {}",
            expected.len(),
            got.len()
        )));
    }
    for (index, (e, g)) in expected.iter().zip(got).enumerate() {
        if e != g {
            return Err(NeuralPerfError::StateMismatch(format!(
                "parameter {index}: network shape {e:?}, checkpoint shape {g:?}"
            )));
        }
    }
    Ok(())
}

//! Generator networks.
//!
//! Two variants share the [`GeneratorNetwork`] contract:
//!
//! - [`UnetGenerator`]: temporal frames stacked as 80 input channels
//! - [`TmpAndUnet`]: one input channel with time on its own axis

mod norm;
mod tmp_unet;
mod unet;

pub use norm::Norm;
pub use tmp_unet::{TmpAndUnet, TmpAndUnetRecord};
pub use unet::{DownLevel, UnetGenerator, UnetGeneratorRecord, UpLevel};

use burn::module::Module;
use burn::prelude::*;

use crate::config::{GeneratorConfig, GeneratorKind};
use crate::error::{NeuralPerfError, Result};

/// Input channels of [`UnetGenerator`] (temporal frames as channels).
pub const UNET_INPUT_CHANNELS: usize = 80;
/// Input channels of [`TmpAndUnet`].
pub const TMP_INPUT_CHANNELS: usize = 1;
/// Output channels of both generators.
pub const OUTPUT_CHANNELS: usize = 1;

/// A generator built from [`GeneratorConfig`] that maps a rank-`D` input
/// to a `[batch, channel, height, width]` image.
pub trait GeneratorNetwork<B: Backend, const D: usize>: Module<B> + Sized {
    /// Architecture variant.
    const KIND: GeneratorKind;

    /// Build the network with its fixed channel layout.
    fn build(config: &GeneratorConfig, device: &B::Device) -> Self;

    /// Forward pass.
    fn generate(&self, input: Tensor<B, D>) -> Tensor<B, 4>;

    /// Check that `record` was produced by a network with the same level
    /// structure. Loading a record that fails this check is not possible.
    fn check_record(&self, record: &<Self as Module<B>>::Record) -> Result<()>;
}

impl<B: Backend> GeneratorNetwork<B, 4> for UnetGenerator<B> {
    const KIND: GeneratorKind = GeneratorKind::Unet;

    fn build(config: &GeneratorConfig, device: &B::Device) -> Self {
        UnetGenerator::new(UNET_INPUT_CHANNELS, OUTPUT_CHANNELS, config, device)
    }

    fn generate(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward(input)
    }

    fn check_record(&self, record: &UnetGeneratorRecord<B>) -> Result<()> {
        if self.record_levels_match(record) {
            Ok(())
        } else {
            Err(level_mismatch(self.num_levels(), record.down.len()))
        }
    }
}

impl<B: Backend> GeneratorNetwork<B, 5> for TmpAndUnet<B> {
    const KIND: GeneratorKind = GeneratorKind::TmpAndUnet;

    fn build(config: &GeneratorConfig, device: &B::Device) -> Self {
        TmpAndUnet::new(TMP_INPUT_CHANNELS, OUTPUT_CHANNELS, config, device)
    }

    fn generate(&self, input: Tensor<B, 5>) -> Tensor<B, 4> {
        self.forward(input)
    }

    fn check_record(&self, record: &TmpAndUnetRecord<B>) -> Result<()> {
        if self.record_levels_match(record) {
            Ok(())
        } else {
            Err(level_mismatch(
                self.unet().num_levels(),
                record.unet.down.len(),
            ))
        }
    }
}

fn level_mismatch(expected: usize, got: usize) -> NeuralPerfError {
    NeuralPerfError::StateMismatch(format!(
        "network has {expected} U-Net levels but the checkpoint has {got}"
    ))
}
